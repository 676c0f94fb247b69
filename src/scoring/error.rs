use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::llm::LlmError;
use crate::vectordb::VectorDbError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector search error: {0}")]
    VectorDb(#[from] VectorDbError),

    #[error("completion error: {0}")]
    Completion(#[from] LlmError),

    #[error("{document_id} is not ready for scoring: extraction {status}")]
    NotExtracted { document_id: String, status: String },

    #[error("scoring task failed: {reason}")]
    TaskFailed { reason: String },
}

pub type ScoringResult<T> = Result<T, ScoringError>;
