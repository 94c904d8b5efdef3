//! Analysis configuration.
//!
//! All tunables of a run live in [`AnalysisConfig`]. It can be loaded from a
//! JSON file (missing fields take their defaults) or built in code:
//!
//! ```no_run
//! use trend_lens::config::AnalysisConfig;
//! use std::path::Path;
//!
//! let config = AnalysisConfig::from_json_file(Path::new("analysis.json"))?;
//! # Ok::<(), trend_lens::AppError>(())
//! ```

use crate::error::{AppError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Garments are accepted while their probability is strictly above this.
    pub confidence_threshold: f64,
    /// Number of k-means clusters per image.
    pub num_colors: usize,
    /// Clusters with fewer member pixels are dropped.
    pub min_cluster_pixels: usize,
    /// Pixels with alpha at or below this count as background.
    pub alpha_threshold: u8,
    pub kmeans_seed: u64,
    pub kmeans_max_iterations: usize,
    pub kmeans_convergence: f32,
    /// Upper bound on corpus-wide dominant colors.
    pub dominant_color_count: usize,
    /// How many reference colors the reference distribution keeps.
    pub reference_top_n: usize,
    /// Channel width of garment/color correlation bins.
    pub correlation_bin_width: f64,
    /// Worker threads for the per-image stage (rayon default when unset).
    pub threads: Option<usize>,
    pub vocabulary: Vocabulary,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.10,
            num_colors: 15,
            min_cluster_pixels: 100,
            alpha_threshold: 50,
            kmeans_seed: 0,
            kmeans_max_iterations: 100,
            kmeans_convergence: 1e-4,
            dominant_color_count: 10,
            reference_top_n: 10,
            correlation_bin_width: 25.0,
            threads: None,
            vocabulary: Vocabulary::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        let config: AnalysisConfig = serde_json::from_str(&content).map_err(|e| AppError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(invalid("confidence_threshold", self.confidence_threshold));
        }
        // Cluster indices are stored as u8.
        if self.num_colors == 0 || self.num_colors > u8::MAX as usize {
            return Err(invalid("num_colors", self.num_colors));
        }
        if self.dominant_color_count == 0 || self.dominant_color_count > u8::MAX as usize {
            return Err(invalid("dominant_color_count", self.dominant_color_count));
        }
        if self.kmeans_max_iterations == 0 {
            return Err(invalid("kmeans_max_iterations", self.kmeans_max_iterations));
        }
        if self.correlation_bin_width <= 0.0 {
            return Err(invalid("correlation_bin_width", self.correlation_bin_width));
        }
        if self.threads == Some(0) {
            return Err(invalid("threads", 0));
        }
        if self.vocabulary.garments().is_empty() {
            return Err(AppError::Config {
                message: "vocabulary has no garment labels".to_string(),
            });
        }
        if self.vocabulary.styles.is_empty() {
            return Err(AppError::Config {
                message: "vocabulary has no style labels".to_string(),
            });
        }
        Ok(())
    }
}

fn invalid(parameter: &str, value: impl std::fmt::Display) -> AppError {
    AppError::Config {
        message: format!("{} = {}", parameter, value),
    }
}

/// Garment and style labels scored by the classifier.
///
/// Garments are grouped under macro categories; the flattened list keeps the
/// category order and the order within each category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    pub garment_categories: IndexMap<String, Vec<String>>,
    pub styles: Vec<String>,
}

impl Vocabulary {
    pub fn garments(&self) -> Vec<String> {
        self.garment_categories.values().flatten().cloned().collect()
    }

    /// Macro category a garment label belongs to.
    pub fn category_of(&self, garment: &str) -> Option<&str> {
        self.garment_categories
            .iter()
            .find(|(_, items)| items.iter().any(|g| g == garment))
            .map(|(category, _)| category.as_str())
    }
}

const GARMENT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Tops",
        &[
            "t-shirt", "blouse", "shirt", "tank top", "crop top", "sweater", "cardigan", "hoodie",
            "sweatshirt", "turtleneck",
        ],
    ),
    (
        "Bottoms",
        &[
            "jeans", "pants", "shorts", "skirt", "leggings", "joggers", "cargo pants",
            "wide-leg pants", "culottes",
        ],
    ),
    (
        "Dresses",
        &["dress", "maxi dress", "midi dress", "mini dress", "slip dress", "bodycon dress"],
    ),
    (
        "Outerwear",
        &[
            "jacket", "coat", "blazer", "bomber jacket", "denim jacket", "leather jacket",
            "trench coat", "puffer jacket",
        ],
    ),
    ("Sets & Jumpsuits", &["suit", "jumpsuit", "romper", "co-ord set", "tracksuit"]),
    ("Activewear", &["sports bra", "athletic shorts", "tennis skirt"]),
    (
        "Shoes",
        &["sneakers", "boots", "heels", "sandals", "flats", "loafers", "platform shoes", "mules"],
    ),
    ("Bags", &["handbag", "backpack", "tote bag", "clutch"]),
    (
        "Accessories",
        &["belt", "scarf", "hat", "cap", "sunglasses", "earrings", "necklace"],
    ),
];

const STYLES: &[&str] = &[
    "minimalist", "streetwear", "bohemian", "vintage", "preppy", "athleisure", "business casual",
    "formal", "avant-garde", "sustainable", "cottagecore", "y2k", "goth", "punk", "grunge",
    "luxury", "haute couture", "casual", "resort wear", "workwear", "retro", "urban", "hip-hop",
    "sporty",
];

impl Default for Vocabulary {
    fn default() -> Self {
        let garment_categories = GARMENT_CATEGORIES
            .iter()
            .map(|(category, items)| {
                (
                    category.to_string(),
                    items.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self {
            garment_categories,
            styles: STYLES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_colors, 15);
        assert_eq!(config.min_cluster_pixels, 100);
        assert!((config.confidence_threshold - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_default_vocabulary() {
        let vocab = Vocabulary::default();
        let garments = vocab.garments();
        assert_eq!(garments.first().map(String::as_str), Some("t-shirt"));
        assert_eq!(garments.last().map(String::as_str), Some("necklace"));
        assert_eq!(vocab.styles.len(), 24);
        assert_eq!(vocab.category_of("maxi dress"), Some("Dresses"));
        assert_eq!(vocab.category_of("spacesuit"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "confidence_threshold": 0.25, "num_colors": 8 }}"#).unwrap();

        let config = AnalysisConfig::from_json_file(file.path()).unwrap();
        assert!((config.confidence_threshold - 0.25).abs() < 1e-12);
        assert_eq!(config.num_colors, 8);
        assert_eq!(config.alpha_threshold, 50);
        assert_eq!(config.vocabulary.styles.len(), 24);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = AnalysisConfig::default();
        config.num_colors = 0;
        assert!(matches!(config.validate(), Err(AppError::Config { .. })));

        let mut config = AnalysisConfig::default();
        config.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.vocabulary.styles.clear();
        assert!(config.validate().is_err());
    }
}
