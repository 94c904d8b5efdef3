use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// A shared resource (color catalog, model session) could not be loaded.
    #[error("Resource unavailable: {resource}: {message}")]
    ResourceUnavailable { resource: String, message: String },

    /// One image failed somewhere between decode and color extraction.
    #[error("Failed to process {source_id}: {message}")]
    ImageProcessing { source_id: String, message: String },

    #[error("Inference failed: {message}")]
    Inference { message: String },

    #[error("Clustering failed: {message}")]
    Clustering { message: String },

    /// No image contributed an accepted garment, so no report can be built.
    #[error("No usable analysis: no image produced an accepted garment")]
    EmptyCorpus,

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Other { message: String },
}

impl AppError {
    pub fn resource(resource: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ResourceUnavailable {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn image_processing(source_id: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::ImageProcessing {
            source_id: source_id.into(),
            message: message.to_string(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        AppError::Inference {
            message: message.into(),
        }
    }

    /// Errors that the pipeline absorbs (fallback or skip) instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::ResourceUnavailable { .. }
                | AppError::ImageProcessing { .. }
                | AppError::Inference { .. }
                | AppError::Clustering { .. }
                | AppError::Image(_)
        )
    }
}

impl From<String> for AppError {
    fn from(message: String) -> Self {
        AppError::Other { message }
    }
}

impl From<&str> for AppError {
    fn from(message: &str) -> Self {
        AppError::Other {
            message: message.to_string(),
        }
    }
}
