use thiserror::Error;
use uuid::Uuid;

use crate::content::ContentError;
use crate::queue::QueueError;
use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job not found: {id}")]
    JobNotFound { id: Uuid },

    #[error("content lookup failed: {0}")]
    Content(#[from] ContentError),

    #[error("document {document_id} is not extracted (status: {status})")]
    NotExtracted { document_id: String, status: String },

    #[error("registry write failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("queue operation failed: {0}")]
    Queue(#[from] QueueError),
}
