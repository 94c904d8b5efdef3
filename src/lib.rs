//! Garment, style and color trend analysis over collections of fashion photos.
//!
//! Every image is classified zero-shot against a garment and a style
//! vocabulary, its subject is isolated from the background, and the remaining
//! pixels are clustered into color swatches matched against a reference
//! catalog. The per-image results are then aggregated into corpus-level
//! distributions and reshaped into the stored report document.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use error::{AppError, Result};
