use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("job not found: {id}")]
    JobNotFound { id: Uuid },

    #[error("job {id} cannot be marked failed without an error message")]
    MissingErrorMessage { id: Uuid },

    #[error("registry storage failed: {reason}")]
    Storage { reason: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
