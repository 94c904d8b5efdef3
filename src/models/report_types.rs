use crate::models::analysis_types::ImageAnalysis;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Occurrence count of one label with its share of all occurrences.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Swatches whose hue falls into one of the fixed hue ranges.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HueRangeShare {
    pub name: String,
    pub count: usize,
    pub percentage: f64,
    /// Up to three hex codes, most saturated and brightest first.
    pub representative_colors: Vec<String>,
    pub reference_code: String,
    pub primary_color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReferenceShare {
    pub name: String,
    pub count: usize,
    pub percentage: f64,
    pub representative_color: String,
}

/// A centroid of the corpus-wide re-clustering of every swatch.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DominantColor {
    pub rgb: [f64; 3],
    pub hex: String,
    pub reference_name: String,
    pub percentage: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ColorMetrics {
    pub total_unique_colors: usize,
    pub average_saturation: f64,
    pub average_brightness: f64,
    pub color_diversity_index: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ColorTrends {
    pub color_range_distribution: Vec<HueRangeShare>,
    pub reference_distribution: Vec<ReferenceShare>,
    pub dominant_colors: Vec<DominantColor>,
    pub metrics: ColorMetrics,
}

/// One quantized color bin of the swatches seen alongside a garment.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GarmentColorBin {
    /// Lower corner of the bin.
    pub bin: [u32; 3],
    /// Mean of the raw member swatch colors.
    pub rgb: [f64; 3],
    pub hex: String,
    pub reference_name: String,
    /// Sum of member proportions, times 100.
    pub frequency: f64,
    pub swatch_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrendReport {
    pub color_trends: ColorTrends,
    pub garment_distribution: Vec<LabelCount>,
    pub macro_distribution: Vec<LabelCount>,
    pub style_distribution: Vec<LabelCount>,
    pub garment_colors: IndexMap<String, Vec<GarmentColorBin>>,
    pub images: Vec<ImageAnalysis>,
    pub images_processed: usize,
    pub images_skipped: usize,
}
