use crate::models::classify_types::{ClassifyResult, LabelScore};
use crate::models::color_types::ColorSwatch;
use serde::{Deserialize, Serialize};

/// Everything learned from one image.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageAnalysis {
    pub source_id: String,
    pub scores: ClassifyResult,
    pub swatches: Vec<ColorSwatch>,
    /// Never empty: falls back to the top garment when nothing clears the threshold.
    pub accepted_garments: Vec<LabelScore>,
    pub primary_style: Option<String>,
}

impl ImageAnalysis {
    pub fn accepts(&self, garment: &str) -> bool {
        self.accepted_garments.iter().any(|g| g.label == garment)
    }
}

/// Per-image result of the pipeline; failures are values, not panics.
#[derive(Debug, Clone)]
pub enum ImageOutcome {
    Analyzed(ImageAnalysis),
    Skipped { source_id: String, reason: String },
}

impl ImageOutcome {
    pub fn source_id(&self) -> &str {
        match self {
            ImageOutcome::Analyzed(analysis) => &analysis.source_id,
            ImageOutcome::Skipped { source_id, .. } => source_id,
        }
    }

    pub fn analysis(&self) -> Option<&ImageAnalysis> {
        match self {
            ImageOutcome::Analyzed(analysis) => Some(analysis),
            ImageOutcome::Skipped { .. } => None,
        }
    }

    pub fn into_analysis(self) -> Option<ImageAnalysis> {
        match self {
            ImageOutcome::Analyzed(analysis) => Some(analysis),
            ImageOutcome::Skipped { .. } => None,
        }
    }
}
