//! Persisted job lifecycle records and their results.
//!
//! The stores are collaborators: anything implementing [`JobStore`] and [`ResultStore`] can
//! back the orchestrator and workers. The in-memory stores are the default.

mod error;
mod memory;
mod model;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use uuid::Uuid;

pub use error::{RegistryError, RegistryResult};
pub use memory::{InMemoryJobStore, InMemoryResultStore};
pub use model::{EvaluationJob, EvaluationResult, JobStatus, NewJob, StatusUpdate, StatusWrite};

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persists a new job with status `queued`.
    async fn create(&self, job: NewJob) -> RegistryResult<EvaluationJob>;

    async fn find_by_id(&self, id: Uuid) -> RegistryResult<Option<EvaluationJob>>;

    /// Writes a status change. Conditional updates whose expected status does not match
    /// return [`StatusWrite::Skipped`] instead of erroring.
    async fn update_status(&self, id: Uuid, update: StatusUpdate) -> RegistryResult<StatusWrite>;

    /// Returns the new count.
    async fn increment_retry_count(&self, id: Uuid) -> RegistryResult<u32>;
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Inserts or replaces the result for `result.job_id`.
    async fn upsert(&self, result: EvaluationResult) -> RegistryResult<()>;

    async fn find_by_job_id(&self, job_id: Uuid) -> RegistryResult<Option<EvaluationResult>>;

    /// Drops the result of `job_id`. Returns whether one was stored.
    async fn remove(&self, job_id: Uuid) -> RegistryResult<bool>;
}
