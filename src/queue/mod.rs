//! Durable, de-duplicated task queue.
//!
//! Tasks are keyed by job id, served by priority then FIFO, retried with backoff up to their
//! attempt limit, and kept for a bounded time after they finish. [`MemoryQueue`] can write its
//! unfinished tasks to a JSON snapshot and reload them at start-up.

mod config;
mod error;
mod memory;
mod model;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use uuid::Uuid;

pub use config::{QueueConfig, Retention};
pub use error::{QueueError, QueueResult};
pub use memory::MemoryQueue;
pub use model::{
    BackoffPolicy, EnqueueOutcome, EvaluationPayload, FailOutcome, QueueStats, QueueTask,
    RemoveOutcome, TaskOptions, TaskState, TaskView,
};

/// Queue operations used by the orchestrator and the worker pool.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Idempotent by `id`: a live task with the same id is left untouched.
    async fn enqueue(
        &self,
        id: Uuid,
        payload: EvaluationPayload,
        options: Option<TaskOptions>,
    ) -> QueueResult<EnqueueOutcome>;

    /// Waits for the next ready task; `None` once the queue is closed.
    async fn next_task(&self) -> Option<QueueTask>;

    /// Sets progress (0-100) of a live task.
    fn update_progress(&self, id: Uuid, progress: u8) -> QueueResult<()>;

    async fn complete(&self, id: Uuid) -> QueueResult<()>;

    async fn fail(&self, id: Uuid, error: &str) -> QueueResult<FailOutcome>;

    async fn get_task(&self, id: Uuid) -> Option<TaskView>;

    async fn remove_task(&self, id: Uuid) -> RemoveOutcome;

    async fn stats(&self) -> QueueStats;

    fn close(&self);
}
