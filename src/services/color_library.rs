use crate::error::{AppError, Result};
use crate::models::color_types::{hex_to_rgb, rgb_to_u8, ColorMatch, ReferenceColor};
use indexmap::IndexMap;
use lab::Lab;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Name given to colors that could not be matched against a catalog.
pub const CUSTOM_COLOR_NAME: &str = "Custom";

#[derive(Deserialize)]
struct CatalogEntry {
    name: String,
    hex: String,
}

/// The reference colors, in catalog order, with Lab values precomputed.
#[derive(Debug, Clone)]
pub struct ColorLibrary {
    colors: Vec<ReferenceColor>,
}

impl ColorLibrary {
    /// Loads a catalog of the form `{ "<code>": { "name": "...", "hex": "RRGGBB" } }`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::resource(
                "color catalog",
                format!("Failed to read {}: {}", path.display(), e),
            )
        })?;
        let library = Self::from_json_str(&content)?;
        log::info!(
            "Loaded color library with {} colors from {}",
            library.len(),
            path.display()
        );
        Ok(library)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        // IndexMap keeps the file order, which decides ties.
        let catalog: IndexMap<String, CatalogEntry> = serde_json::from_str(content)
            .map_err(|e| AppError::resource("color catalog", format!("Failed to parse: {}", e)))?;

        let mut colors = Vec::with_capacity(catalog.len());
        for (code, entry) in catalog {
            let rgb = hex_to_rgb(&entry.hex).ok_or_else(|| {
                AppError::resource(
                    "color catalog",
                    format!("Entry {} has invalid hex '{}'", code, entry.hex),
                )
            })?;
            colors.push(ReferenceColor {
                name: format!("PANTONE {} {}", code, title_case(&entry.name)),
                hex: format!("#{}", entry.hex.trim().trim_start_matches('#')),
                rgb,
                lab: Lab::from_rgb(&rgb),
            });
        }
        Self::from_colors(colors)
    }

    /// Builds a library from already named colors; names and hex codes are used as given.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut colors = Vec::new();
        for (name, hex) in entries {
            let rgb = hex_to_rgb(hex).ok_or_else(|| {
                AppError::resource("color catalog", format!("Invalid hex '{}' for {}", hex, name))
            })?;
            colors.push(ReferenceColor {
                name: name.to_string(),
                hex: hex.to_string(),
                rgb,
                lab: Lab::from_rgb(&rgb),
            });
        }
        Self::from_colors(colors)
    }

    fn from_colors(colors: Vec<ReferenceColor>) -> Result<Self> {
        if colors.is_empty() {
            return Err(AppError::resource("color catalog", "catalog is empty"));
        }
        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[ReferenceColor] {
        &self.colors
    }

    /// Closest reference color by CIE76 ΔE, with the distance. First minimum wins.
    pub fn nearest_with_distance(&self, rgb: [f64; 3]) -> (&ReferenceColor, f32) {
        let lab = Lab::from_rgb(&rgb_to_u8(rgb));
        let mut best = &self.colors[0];
        let mut min_dist = f32::MAX;

        for color in &self.colors {
            let l_diff = lab.l - color.lab.l;
            let a_diff = lab.a - color.lab.a;
            let b_diff = lab.b - color.lab.b;
            let dist = (l_diff * l_diff + a_diff * a_diff + b_diff * b_diff).sqrt();

            if dist < min_dist {
                min_dist = dist;
                best = color;
            }
        }
        (best, min_dist)
    }

    pub fn nearest(&self, rgb: [f64; 3]) -> ColorMatch {
        let (color, _) = self.nearest_with_distance(rgb);
        ColorMatch {
            name: color.name.clone(),
            hex: color.hex.clone(),
        }
    }
}

/// Resolves any color to a named reference, falling back to a literal hex
/// when no library is loaded. Never fails.
#[derive(Debug, Clone, Default)]
pub struct ColorMatcher {
    library: Option<Arc<ColorLibrary>>,
}

impl ColorMatcher {
    pub fn new(library: Arc<ColorLibrary>) -> Self {
        Self {
            library: Some(library),
        }
    }

    pub fn unavailable() -> Self {
        Self { library: None }
    }

    /// Loads the catalog at `path`; a failed load leaves the matcher in fallback mode.
    pub fn load_or_fallback(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::warn!("No color catalog configured, colors will be reported as literal hex");
            return Self::unavailable();
        };
        match ColorLibrary::load(path) {
            Ok(library) => Self::new(Arc::new(library)),
            Err(e) => {
                log::warn!("{}; colors will be reported as literal hex", e);
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.library.is_some()
    }

    pub fn library(&self) -> Option<&ColorLibrary> {
        self.library.as_deref()
    }

    pub fn match_rgb(&self, rgb: [f64; 3]) -> ColorMatch {
        match &self.library {
            Some(library) => library.nearest(rgb),
            None => fallback_match(rgb),
        }
    }
}

fn fallback_match(rgb: [f64; 3]) -> ColorMatch {
    let [r, g, b] = rgb_to_u8(rgb);
    ColorMatch {
        name: CUSTOM_COLOR_NAME.to_string(),
        hex: format!("#{:02x}{:02x}{:02x}", r, g, b),
    }
}

/// Uppercases the first letter of every run of letters and lowercases the rest;
/// dashes become spaces.
fn title_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        let c = if c == '-' { ' ' } else { c };
        if c.is_alphabetic() {
            if in_word {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            result.push(c);
            in_word = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "18-1662": { "name": "flame-scarlet", "hex": "CD212A" },
        "19-4045": { "name": "lapis-blue", "hex": "004B8D" },
        "11-0601": { "name": "bright-white", "hex": "F4F5F0" },
        "19-4005": { "name": "stretch-limo", "hex": "2B2C30" }
    }"#;

    #[test]
    fn test_catalog_names_and_order() {
        let library = ColorLibrary::from_json_str(CATALOG).unwrap();
        let names: Vec<&str> = library.colors().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "PANTONE 18-1662 Flame Scarlet",
                "PANTONE 19-4045 Lapis Blue",
                "PANTONE 11-0601 Bright White",
                "PANTONE 19-4005 Stretch Limo",
            ]
        );
        assert_eq!(library.colors()[0].hex, "#CD212A");
    }

    #[test]
    fn test_title_case_restarts_after_any_non_letter() {
        assert_eq!(title_case("flame-scarlet"), "Flame Scarlet");
        assert_eq!(title_case("blue/green"), "Blue/Green");
        assert_eq!(title_case("o'NEIL 2tone"), "O'Neil 2Tone");
        assert_eq!(title_case("classic  BLUE"), "Classic  Blue");
    }

    #[test]
    fn test_exact_reference_round_trip() {
        let library = ColorLibrary::from_json_str(CATALOG).unwrap();
        for color in library.colors() {
            let rgb = color.rgb.map(f64::from);
            let (found, distance) = library.nearest_with_distance(rgb);
            assert_eq!(found.name, color.name);
            assert_eq!(found.hex, color.hex);
            assert_eq!(distance, 0.0);
        }
    }

    #[test]
    fn test_nearest_picks_perceptual_neighbor() {
        let library = ColorLibrary::from_json_str(CATALOG).unwrap();
        assert_eq!(library.nearest([250.0, 10.0, 20.0]).name, "PANTONE 18-1662 Flame Scarlet");
        assert_eq!(library.nearest([10.0, 40.0, 200.0]).name, "PANTONE 19-4045 Lapis Blue");
        assert_eq!(library.nearest([255.0, 255.0, 255.0]).name, "PANTONE 11-0601 Bright White");
        assert_eq!(library.nearest([0.0, 0.0, 0.0]).name, "PANTONE 19-4005 Stretch Limo");
    }

    #[test]
    fn test_ties_go_to_first_entry() {
        let library =
            ColorLibrary::from_entries([("First Red", "#FF0000"), ("Second Red", "#FF0000")]).unwrap();
        assert_eq!(library.nearest([255.0, 0.0, 0.0]).name, "First Red");
    }

    #[test]
    fn test_fractional_channels_are_truncated() {
        let library = ColorLibrary::from_entries([("A", "#FE0000"), ("B", "#FF0000")]).unwrap();
        let (found, distance) = library.nearest_with_distance([254.9, 0.0, 0.0]);
        assert_eq!(found.name, "A");
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_invalid_catalog_is_resource_error() {
        let err = ColorLibrary::from_json_str("not json").unwrap_err();
        assert!(matches!(err, AppError::ResourceUnavailable { .. }));

        let err = ColorLibrary::from_json_str(r#"{"x": {"name": "bad", "hex": "ZZZZZZ"}}"#).unwrap_err();
        assert!(matches!(err, AppError::ResourceUnavailable { .. }));

        assert!(ColorLibrary::from_json_str("{}").is_err());
    }

    #[test]
    fn test_matcher_fallback_is_literal_hex() {
        let matcher = ColorMatcher::unavailable();
        let m = matcher.match_rgb([171.6, 15.2, 0.0]);
        assert_eq!(m.name, CUSTOM_COLOR_NAME);
        assert_eq!(m.hex, "#ab0f00");
    }

    #[test]
    fn test_missing_catalog_file_falls_back() {
        let matcher = ColorMatcher::load_or_fallback(Some(Path::new("/nonexistent/catalog.json")));
        assert!(!matcher.is_available());
        assert_eq!(matcher.match_rgb([0.0, 0.0, 0.0]).name, CUSTOM_COLOR_NAME);
    }
}
