use crate::config::AnalysisConfig;
use crate::error::{AppError, Result};
use crate::models::schema_types::{ExportedReport, TrendDocument};
use crate::services::classifier::inference::OnnxEmbeddingOracle;
use crate::services::classifier::model_manager::{ModelPaths, SessionOptions};
use crate::services::classifier::ZeroShotClassifier;
use crate::services::color_library::ColorMatcher;
use crate::services::fs_service;
use crate::services::isolation::{OnnxBackgroundRemover, SubjectIsolator};
use crate::services::pipeline::TrendAnalyzer;
use crate::services::report_transformer;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    /// Image file or directory of images.
    pub source: PathBuf,
    pub catalog: Option<PathBuf>,
    pub models: ModelPaths,
    pub session: SessionOptions,
    pub config: AnalysisConfig,
    pub output: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeSummary {
    pub output: PathBuf,
    pub images_processed: usize,
    pub images_skipped: usize,
    pub top_garments: Vec<String>,
    pub top_styles: Vec<String>,
}

/// Loads the shared resources once and wires them into an analyzer.
///
/// The embedding model is required. A missing color catalog or background
/// model only degrades the run.
pub fn build_analyzer(
    config: AnalysisConfig,
    models: &ModelPaths,
    session: SessionOptions,
    catalog: Option<&Path>,
) -> Result<TrendAnalyzer> {
    let matcher = ColorMatcher::load_or_fallback(catalog);

    let image_encoder = models
        .image_encoder
        .as_deref()
        .ok_or_else(|| AppError::resource("image encoder", "no model path given"))?;
    let text_embeddings = models
        .text_embeddings
        .as_deref()
        .ok_or_else(|| AppError::resource("text embeddings", "no embedding table given"))?;
    let oracle = OnnxEmbeddingOracle::load(image_encoder, text_embeddings, session)?;
    let classifier = ZeroShotClassifier::new(Arc::new(oracle), &config.vocabulary)?;

    let isolator = match models.background_remover.as_deref() {
        Some(path) => match OnnxBackgroundRemover::load(path, session) {
            Ok(remover) => SubjectIsolator::new(Arc::new(remover)),
            Err(e) => {
                log::warn!("{}; colors will be taken from whole images", e);
                SubjectIsolator::passthrough()
            }
        },
        None => {
            log::warn!("No background model configured; colors will be taken from whole images");
            SubjectIsolator::passthrough()
        }
    };

    Ok(TrendAnalyzer::new(config, classifier, isolator, matcher))
}

pub fn analyze(request: AnalyzeRequest) -> Result<AnalyzeSummary> {
    request.config.validate()?;

    let sources = fs_service::resolve_sources(&request.source)?;
    let analyzer = build_analyzer(
        request.config,
        &request.models,
        request.session,
        request.catalog.as_deref(),
    )?;

    let report = analyzer.run(&sources)?;
    let document = report_transformer::transform(&report);
    export_to_json(&document, &request.source.to_string_lossy(), &request.output)?;

    Ok(AnalyzeSummary {
        output: request.output,
        images_processed: document.images_processed,
        images_skipped: document.images_skipped,
        top_garments: document.garment_trends.top_garments.clone(),
        top_styles: document.style_trends.top_styles.clone(),
    })
}

/// Writes the document as pretty JSON, stamped with its source and the current time.
pub fn export_to_json(document: &TrendDocument, source_file: &str, output: &Path) -> Result<ExportedReport> {
    let exported = ExportedReport {
        source_file: source_file.to_string(),
        analyzed_at: chrono::Local::now().to_rfc3339(),
        document: document.clone(),
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(&exported)?;
    std::fs::write(output, json)?;

    log::info!("Exported trend report to {}", output.display());
    Ok(exported)
}
