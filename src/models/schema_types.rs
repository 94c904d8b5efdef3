//! The externally agreed JSON shape of a trend report.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrendDocument {
    pub color_trends: ColorTrendsDoc,
    pub garment_trends: GarmentTrendsDoc,
    pub style_trends: StyleTrendsDoc,
    pub color_garment_trends: IndexMap<String, Vec<GarmentColorDoc>>,
    pub detailed_image_analysis: Vec<ImageDoc>,
    pub images_processed: usize,
    pub images_skipped: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ColorTrendsDoc {
    pub dominant_colors: Vec<DominantColorDoc>,
    pub color_range_distribution: IndexMap<String, HueRangeDoc>,
    pub pantone_distribution: IndexMap<String, ReferenceShareDoc>,
    pub color_metrics: ColorMetricsDoc,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DominantColorDoc {
    pub rgb: [u8; 3],
    pub hex: String,
    pub pantone_ref: String,
    pub proportion: f64,
    pub percentage: f64,
    pub color_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HueRangeDoc {
    pub count: usize,
    pub percentage: f64,
    pub representative_colors: Vec<String>,
    pub pantone_ref: String,
    pub primary_color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReferenceShareDoc {
    pub count: usize,
    pub percentage: f64,
    pub representative_color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ColorMetricsDoc {
    pub total_unique_colors: usize,
    pub average_saturation: f64,
    pub average_brightness: f64,
    pub color_diversity_index: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CountDoc {
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GarmentTrendsDoc {
    pub distribution: IndexMap<String, CountDoc>,
    pub top_garments: Vec<String>,
    pub macro_distribution: IndexMap<String, CountDoc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StyleTrendsDoc {
    pub distribution: IndexMap<String, CountDoc>,
    pub top_styles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GarmentColorDoc {
    pub rgb: [u8; 3],
    pub hex: String,
    pub frequency: f64,
    pub color_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageDoc {
    pub source: String,
    pub garment_analysis: GarmentAnalysisDoc,
    pub colors: Vec<SwatchDoc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GarmentAnalysisDoc {
    pub primary_category: Option<String>,
    pub confidence_category: Option<f64>,
    pub primary_style: Option<String>,
    pub accepted_garments: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SwatchDoc {
    pub rgb: [u8; 3],
    pub hex: String,
    pub proportion: f64,
    pub color_name: String,
    pub pantone_ref: String,
}

/// A document as written to disk, stamped with its origin and time.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportedReport {
    pub source_file: String,
    pub analyzed_at: String,
    #[serde(flatten)]
    pub document: TrendDocument,
}
