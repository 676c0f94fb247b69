//! Text embedding.
//!
//! [`BertEmbedder`] runs a local BERT sentence encoder; use [`EmbedderConfig::stub`] (or
//! [`BertEmbedder::stub`]) for tests and offline runs without model files.

mod bert;
mod config;
mod device;
mod error;

#[cfg(test)]
mod tests;

pub use bert::{BertEmbedder, prepare_input};
pub use config::EmbedderConfig;
pub use error::EmbeddingError;

/// Turns text into a fixed-size vector.
///
/// Implementations reject empty text and always return `embedding_dim()` floats.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn embedding_dim(&self) -> usize;
}
