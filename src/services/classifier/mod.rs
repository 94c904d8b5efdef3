pub mod embedding;
pub mod inference;
pub mod model_manager;

pub use embedding::{select_garments, top_style, EmbeddingOracle, ZeroShotClassifier};
