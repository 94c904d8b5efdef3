use crate::error::{AppError, Result};
use crate::models::color_types::hex_to_rgb;
use crate::services::color_library::ColorMatcher;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize, PartialEq)]
pub struct MatchColorResult {
    pub input: String,
    pub name: String,
    pub hex: String,
    /// CIE76 ΔE to the match; absent in fallback mode.
    pub distance: Option<f32>,
}

/// Resolves a `#RRGGBB` color to its nearest catalog entry.
pub fn match_color(hex: &str, catalog: Option<&Path>) -> Result<MatchColorResult> {
    let matcher = ColorMatcher::load_or_fallback(catalog);
    match_with(hex, &matcher)
}

pub fn match_with(hex: &str, matcher: &ColorMatcher) -> Result<MatchColorResult> {
    let rgb = hex_to_rgb(hex).ok_or_else(|| AppError::Other {
        message: format!("Invalid hex color '{}'", hex),
    })?;
    let rgb = rgb.map(f64::from);

    let result = match matcher.library() {
        Some(library) => {
            let (color, distance) = library.nearest_with_distance(rgb);
            MatchColorResult {
                input: hex.to_string(),
                name: color.name.clone(),
                hex: color.hex.clone(),
                distance: Some(distance),
            }
        }
        None => {
            let fallback = matcher.match_rgb(rgb);
            MatchColorResult {
                input: hex.to_string(),
                name: fallback.name,
                hex: fallback.hex,
                distance: None,
            }
        }
    };
    Ok(result)
}
