use serde::Serialize;
use uuid::Uuid;

/// Task lifecycle notifications published by the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerEvent {
    Started { task_id: Uuid, attempt: u32 },
    Progress { task_id: Uuid, progress: u8 },
    Completed { task_id: Uuid },
    Failed {
        task_id: Uuid,
        error: String,
        /// The queue will deliver the task again after a backoff.
        will_retry: bool,
    },
}

impl WorkerEvent {
    pub fn task_id(&self) -> Uuid {
        match self {
            WorkerEvent::Started { task_id, .. }
            | WorkerEvent::Progress { task_id, .. }
            | WorkerEvent::Completed { task_id }
            | WorkerEvent::Failed { task_id, .. } => *task_id,
        }
    }
}

/// Turns worker events into log records.
pub fn log_event(event: &WorkerEvent) {
    match event {
        WorkerEvent::Started { task_id, attempt } => {
            tracing::info!(%task_id, attempt, "Task started");
        }
        WorkerEvent::Progress { task_id, progress } => {
            tracing::debug!(%task_id, progress, "Task progress");
        }
        WorkerEvent::Completed { task_id } => {
            tracing::info!(%task_id, "Task completed");
        }
        WorkerEvent::Failed {
            task_id,
            error,
            will_retry,
        } => {
            tracing::error!(%task_id, %error, will_retry, "Task failed");
        }
    }
}
