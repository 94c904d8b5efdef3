use crate::config::AnalysisConfig;
use crate::error::{AppError, Result};
use crate::models::analysis_types::{ImageAnalysis, ImageOutcome};
use crate::models::report_types::TrendReport;
use crate::services::aggregator::TrendAggregator;
use crate::services::classifier::{select_garments, top_style, ZeroShotClassifier};
use crate::services::color_library::ColorMatcher;
use crate::services::color_service::ColorExtractor;
use crate::services::fs_service::ImageSource;
use crate::services::isolation::SubjectIsolator;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Shared, read-only state of one analysis run.
pub struct TrendAnalyzer {
    config: AnalysisConfig,
    classifier: ZeroShotClassifier,
    isolator: SubjectIsolator,
    extractor: ColorExtractor,
    matcher: ColorMatcher,
}

impl TrendAnalyzer {
    pub fn new(
        config: AnalysisConfig,
        classifier: ZeroShotClassifier,
        isolator: SubjectIsolator,
        matcher: ColorMatcher,
    ) -> Self {
        let extractor = ColorExtractor::from_config(&config);
        Self {
            config,
            classifier,
            isolator,
            extractor,
            matcher,
        }
    }

    /// Classifies the original image and extracts colors from its isolated subject.
    pub fn analyze_image(&self, source: &dyn ImageSource) -> Result<ImageAnalysis> {
        let id = source.id();

        // 1. Decode
        let image = source.load()?;

        // 2. Classify the unmodified image
        let scores = self
            .classifier
            .classify(&image)
            .map_err(|e| AppError::image_processing(id, e))?;
        let accepted_garments = select_garments(&scores.garment_scores, self.config.confidence_threshold);
        let primary_style = top_style(&scores.style_scores);

        // 3. Colors of the subject only
        let isolated = self.isolator.isolate(id, &image);
        let swatches = self
            .extractor
            .extract(&isolated, &self.matcher)
            .map_err(|e| AppError::image_processing(id, e))?;

        Ok(ImageAnalysis {
            source_id: id.to_string(),
            scores,
            swatches,
            accepted_garments,
            primary_style,
        })
    }

    /// Like [`analyze_image`](Self::analyze_image), but a failure becomes a skip.
    pub fn process(&self, source: &dyn ImageSource) -> ImageOutcome {
        match self.analyze_image(source) {
            Ok(analysis) => ImageOutcome::Analyzed(analysis),
            Err(e) => {
                if e.is_recoverable() {
                    log::warn!("Skipping {}: {}", source.id(), e);
                } else {
                    log::error!("Skipping {}: {}", source.id(), e);
                }
                ImageOutcome::Skipped {
                    source_id: source.id().to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Processes every source on the current rayon pool. Outcomes keep input order.
    pub fn process_all(&self, sources: &[Box<dyn ImageSource>]) -> Vec<ImageOutcome> {
        let total = sources.len();
        let done = AtomicUsize::new(0);
        let start_time = Instant::now();

        let outcomes: Vec<ImageOutcome> = sources
            .par_iter()
            .map(|source| {
                let outcome = self.process(source.as_ref());

                let count = done.fetch_add(1, Ordering::Relaxed) + 1;
                let elapsed = start_time.elapsed().as_secs_f64();
                let remaining = (elapsed / count as f64 * total.saturating_sub(count) as f64) as u64;
                log::info!(
                    "[{}/{}] {} (~{}s remaining)",
                    count,
                    total,
                    source.id(),
                    remaining
                );
                outcome
            })
            .collect();

        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o, ImageOutcome::Skipped { .. }))
            .count();
        log::info!(
            "Processed {} images in {:.1}s ({} skipped)",
            total,
            start_time.elapsed().as_secs_f64(),
            skipped
        );
        outcomes
    }

    /// Per-image stage, then aggregation once every image is done.
    pub fn run(&self, sources: &[Box<dyn ImageSource>]) -> Result<TrendReport> {
        let outcomes = self.process_all(sources);
        TrendAggregator::new(&self.config, &self.matcher)
            .aggregate(outcomes)
            .ok_or(AppError::EmptyCorpus)
    }
}
