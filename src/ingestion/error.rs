use thiserror::Error;

use crate::constants::DimValidationError;
use crate::embedding::EmbeddingError;
use crate::vectordb::{DocumentType, VectorDbError};

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("invalid ingestion configuration: {reason}")]
    Config { reason: String },

    #[error("reference document '{document_type}' unavailable: {reason}")]
    Source {
        document_type: DocumentType,
        reason: String,
    },

    #[error("reference document '{document_type}' is empty")]
    EmptyDocument { document_type: DocumentType },

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Dimension(#[from] DimValidationError),

    #[error(transparent)]
    VectorDb(#[from] VectorDbError),

    #[error("embedding task failed: {reason}")]
    TaskFailed { reason: String },
}

pub type IngestionResult<T> = Result<T, IngestionError>;
