use crate::config::Vocabulary;
use crate::error::{AppError, Result};
use crate::models::classify_types::{ClassifyResult, LabelScore};
use image::DynamicImage;
use std::sync::Arc;

/// Similarity logits are cosine similarities times this factor.
pub const LOGIT_SCALE: f64 = 100.0;

/// A model that embeds images and text labels into one similarity space.
pub trait EmbeddingOracle: Send + Sync {
    fn encode_image(&self, image: &DynamicImage) -> Result<Vec<f32>>;
    fn encode_text(&self, label: &str) -> Result<Vec<f32>>;
}

struct EncodedLabel {
    label: String,
    embedding: Vec<f64>,
}

/// Scores images against the garment and style vocabularies.
///
/// Label embeddings are computed once at construction.
pub struct ZeroShotClassifier {
    oracle: Arc<dyn EmbeddingOracle>,
    garments: Vec<EncodedLabel>,
    styles: Vec<EncodedLabel>,
}

impl ZeroShotClassifier {
    pub fn new(oracle: Arc<dyn EmbeddingOracle>, vocabulary: &Vocabulary) -> Result<Self> {
        let garments = encode_labels(oracle.as_ref(), &vocabulary.garments())?;
        let styles = encode_labels(oracle.as_ref(), &vocabulary.styles)?;
        log::info!(
            "Encoded {} garment and {} style labels",
            garments.len(),
            styles.len()
        );
        Ok(Self {
            oracle,
            garments,
            styles,
        })
    }

    pub fn classify(&self, image: &DynamicImage) -> Result<ClassifyResult> {
        let embedding = normalize(&self.oracle.encode_image(image)?);
        if embedding.iter().all(|&x| x == 0.0) {
            return Err(AppError::inference("image embedding is all zeros"));
        }
        for labels in [&self.garments, &self.styles] {
            if let Some(first) = labels.first() {
                if first.embedding.len() != embedding.len() {
                    return Err(AppError::inference(format!(
                        "image embedding has {} dimensions, label embeddings have {}",
                        embedding.len(),
                        first.embedding.len()
                    )));
                }
            }
        }

        Ok(ClassifyResult {
            garment_scores: rank(&embedding, &self.garments),
            style_scores: rank(&embedding, &self.styles),
        })
    }
}

fn encode_labels(oracle: &dyn EmbeddingOracle, labels: &[String]) -> Result<Vec<EncodedLabel>> {
    labels
        .iter()
        .map(|label| {
            let embedding = normalize(&oracle.encode_text(label)?);
            Ok(EncodedLabel {
                label: label.clone(),
                embedding,
            })
        })
        .collect()
}

/// L2-normalizes; a zero vector stays zero.
fn normalize(vector: &[f32]) -> Vec<f64> {
    let v: Vec<f64> = vector.iter().map(|&x| f64::from(x)).collect();
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v
    }
}

/// Temperature-scaled softmax over cosine similarities, sorted descending.
/// Equal probabilities keep vocabulary order.
fn rank(image: &[f64], labels: &[EncodedLabel]) -> Vec<LabelScore> {
    let logits: Vec<f64> = labels
        .iter()
        .map(|l| LOGIT_SCALE * l.embedding.iter().zip(image).map(|(a, b)| a * b).sum::<f64>())
        .collect();

    let probabilities = softmax(&logits);

    let mut scores: Vec<LabelScore> = labels
        .iter()
        .zip(probabilities)
        .map(|(l, p)| LabelScore::new(l.label.clone(), p))
        .collect();
    scores.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scores
}

pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max_logit = logits.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f64> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let exp_sum: f64 = exps.iter().sum();
    exps.iter().map(|x| x / exp_sum).collect()
}

/// Accepts the leading garments whose probability is strictly above `threshold`,
/// or the top garment alone when none is.
pub fn select_garments(scores: &[LabelScore], threshold: f64) -> Vec<LabelScore> {
    let accepted: Vec<LabelScore> = scores
        .iter()
        .take_while(|s| s.probability > threshold)
        .cloned()
        .collect();

    if accepted.is_empty() {
        return scores.first().cloned().into_iter().collect();
    }
    accepted
}

/// Styles only ever contribute their single best label.
pub fn top_style(scores: &[LabelScore]) -> Option<String> {
    scores.first().map(|s| s.label.clone())
}
