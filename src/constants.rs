//! Cross-cutting, shared constants.
//!
//! # Dimension Invariants
//!
//! The embedding dimension is shared by the embedder, the vector collection and the
//! ingestion pipeline. A collection created with one dimension cannot accept vectors of
//! another, so use [`validate_embedding_dim`] at module boundaries to catch mismatches early.

/// Output dimension of the bge-small family of sentence encoders.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

pub const DEFAULT_VECTOR_SIZE_U64: u64 = DEFAULT_EMBEDDING_DIM as u64;

/// Max tokens fed to the encoder.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Rough chars-per-token ratio used to pre-truncate text before tokenization.
pub const CHARS_PER_TOKEN: usize = 4;

/// Max characters embedded in one call (`DEFAULT_MAX_SEQ_LEN * CHARS_PER_TOKEN`).
pub const MAX_EMBED_CHARS: usize = DEFAULT_MAX_SEQ_LEN * CHARS_PER_TOKEN;

pub const DEFAULT_COLLECTION_NAME: &str = "evaluation_docs";

pub const DEFAULT_CHUNK_WINDOW: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Errors from dimension validation helpers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DimValidationError {
    /// Dimension was zero.
    #[error("embedding dimension cannot be zero")]
    ZeroDimension,

    /// Embedding length did not match the expected dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: usize, actual: usize },
}

/// Validates that an embedding has the dimension the collection was created with.
#[inline]
pub fn validate_embedding_dim(embedding: &[f32], expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if embedding.len() != expected {
        return Err(DimValidationError::Mismatch {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(())
}
