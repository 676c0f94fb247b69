use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no extracted content for document '{document_id}'")]
    NotFound { document_id: String },

    #[error("content store unavailable: {reason}")]
    Unavailable { reason: String },
}
