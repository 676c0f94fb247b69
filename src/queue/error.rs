use thiserror::Error;
use uuid::Uuid;

use super::model::TaskState;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is closed")]
    Closed,

    #[error("task not found: {id}")]
    TaskNotFound { id: Uuid },

    #[error("task {id} is {state}, expected active")]
    NotActive { id: Uuid, state: TaskState },

    #[error("only completed or failed tasks can be cleaned, got {state}")]
    NotTerminal { state: TaskState },

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type QueueResult<T> = Result<T, QueueError>;
