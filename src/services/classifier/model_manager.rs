use crate::error::{AppError, Result};
use ort::session::Session;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Once;

static ORT_INIT: Once = Once::new();

/// Where the model files of a run live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelPaths {
    /// Image encoder producing the shared-space embedding.
    pub image_encoder: Option<PathBuf>,
    /// JSON table `label -> [f32]` of precomputed text embeddings.
    pub text_embeddings: Option<PathBuf>,
    /// Saliency model used for background removal.
    pub background_remover: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionOptions {
    pub use_gpu: bool,
    pub intra_threads: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            use_gpu: false,
            intra_threads: 4,
        }
    }
}

/// Builds an ONNX Runtime session for the model at `model_path`.
pub fn load_session(model_path: &Path, options: SessionOptions) -> Result<Session> {
    if !model_path.exists() {
        return Err(AppError::resource(
            "onnx model",
            format!("{} does not exist", model_path.display()),
        ));
    }

    ORT_INIT.call_once(|| {
        let _ = ort::init().with_name("trend-lens").commit();
    });

    let mut builder = Session::builder()
        .map_err(|e| AppError::inference(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
        .map_err(|e| AppError::inference(format!("Failed to set optimization level: {}", e)))?
        .with_intra_threads(options.intra_threads)
        .map_err(|e| AppError::inference(format!("Failed to set intra threads: {}", e)))?;

    if options.use_gpu {
        builder = builder
            .with_execution_providers([
                ort::execution_providers::DirectML::default().build(),
                ort::execution_providers::CoreML::default().build(),
                ort::execution_providers::CUDA::default().build(),
                ort::execution_providers::CPU::default().build(),
            ])
            .map_err(|e| {
                AppError::inference(format!("Failed to register GPU execution providers: {}", e))
            })?;
    } else {
        builder = builder
            .with_execution_providers([
                ort::execution_providers::CPU::default().build(),
            ])
            .map_err(|e| {
                AppError::inference(format!("Failed to register CPU execution provider: {}", e))
            })?;
    }

    let session = builder.commit_from_file(model_path).map_err(|e| {
        AppError::resource(
            "onnx model",
            format!("Failed to load {}: {}", model_path.display(), e),
        )
    })?;

    log::info!("Loaded ONNX model {}", model_path.display());
    Ok(session)
}
