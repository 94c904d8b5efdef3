use serde::{Deserialize, Serialize};

/// One label of a vocabulary with its softmax probability.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub probability: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// Ranked scores for both vocabularies of one image, each sorted descending.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ClassifyResult {
    pub garment_scores: Vec<LabelScore>,
    pub style_scores: Vec<LabelScore>,
}

impl ClassifyResult {
    pub fn top_garment(&self) -> Option<&LabelScore> {
        self.garment_scores.first()
    }

    pub fn top_style(&self) -> Option<&LabelScore> {
        self.style_scores.first()
    }
}
