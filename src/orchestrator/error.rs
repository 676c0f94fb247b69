use thiserror::Error;
use uuid::Uuid;

use crate::queue::QueueError;
use crate::registry::{JobStatus, RegistryError};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    #[error("evaluation job not found: {id}")]
    NotFound { id: Uuid },

    #[error("job {id} is {status}: {reason}")]
    InvalidState {
        id: Uuid,
        status: JobStatus,
        reason: &'static str,
    },

    #[error("document '{document_id}' is not ready for evaluation (extraction {status})")]
    Extraction { document_id: String, status: String },

    #[error("persistence failed: {reason}")]
    Persistence { reason: String },

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl OrchestratorError {
    /// `true` for errors caused by the request rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OrchestratorError::Validation { .. }
                | OrchestratorError::NotFound { .. }
                | OrchestratorError::InvalidState { .. }
                | OrchestratorError::Extraction { .. }
        )
    }
}

impl From<RegistryError> for OrchestratorError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::JobNotFound { id } => OrchestratorError::NotFound { id },
            other => OrchestratorError::Persistence {
                reason: other.to_string(),
            },
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
