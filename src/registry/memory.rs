use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use uuid::Uuid;

use crate::snapshot::{read_records, write_records};

use super::error::{RegistryError, RegistryResult};
use super::model::{EvaluationJob, EvaluationResult, JobStatus, NewJob, StatusUpdate, StatusWrite};
use super::{JobStore, ResultStore};

/// Applies `update` to `job`, keeping the timestamp and error invariants.
pub(crate) fn apply_update(job: &mut EvaluationJob, update: &StatusUpdate) -> RegistryResult<()> {
    let now = Utc::now();
    match update.status {
        JobStatus::Queued => {
            job.error_message = None;
            job.completed_at = None;
        }
        JobStatus::Processing => {
            job.error_message = None;
            job.completed_at = None;
            job.started_at.get_or_insert(now);
        }
        JobStatus::Completed => {
            job.error_message = None;
            job.completed_at = Some(now);
        }
        JobStatus::Failed => {
            let message = update
                .error_message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .ok_or(RegistryError::MissingErrorMessage { id: job.id })?;
            job.error_message = Some(message);
            job.completed_at = None;
        }
    }
    job.status = update.status;
    Ok(())
}

/// Job store backed by a map. Default registry for the binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, EvaluationJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Writes every job to `path` as JSON.
    pub async fn persist(&self, path: &Path) -> RegistryResult<usize> {
        let mut jobs: Vec<EvaluationJob> = self.jobs.read().values().cloned().collect();
        jobs.sort_by_key(|job| job.created_at);
        persist_records(path, &jobs, "jobs").await
    }

    /// Loads jobs written by [`persist`](Self::persist), replacing records with the same id.
    /// A missing file restores nothing.
    pub async fn restore(&self, path: &Path) -> RegistryResult<usize> {
        let jobs: Vec<EvaluationJob> = restore_records(path, "jobs").await?;
        let restored = jobs.len();
        let mut map = self.jobs.write();
        for job in jobs {
            map.insert(job.id, job);
        }
        Ok(restored)
    }
}

async fn persist_records<T: Serialize>(
    path: &Path,
    records: &[T],
    kind: &'static str,
) -> RegistryResult<usize> {
    write_records(path, records)
        .await
        .map_err(|e| RegistryError::Storage {
            reason: format!("writing {kind} snapshot {}: {e}", path.display()),
        })?;
    info!(path = %path.display(), count = records.len(), kind, "Registry snapshot written");
    Ok(records.len())
}

async fn restore_records<T: DeserializeOwned>(
    path: &Path,
    kind: &'static str,
) -> RegistryResult<Vec<T>> {
    let records: Vec<T> = read_records(path)
        .await
        .map_err(|e| RegistryError::Storage {
            reason: format!("reading {kind} snapshot {}: {e}", path.display()),
        })?
        .unwrap_or_default();
    info!(path = %path.display(), count = records.len(), kind, "Registry snapshot restored");
    Ok(records)
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: NewJob) -> RegistryResult<EvaluationJob> {
        let record = EvaluationJob {
            id: Uuid::new_v4(),
            job_title: job.job_title,
            cv_document_id: job.cv_document_id,
            project_document_id: job.project_document_id,
            status: JobStatus::Queued,
            error_message: None,
            retry_count: 0,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        };
        self.jobs.write().insert(record.id, record.clone());
        debug!(job_id = %record.id, "Job created");
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> RegistryResult<Option<EvaluationJob>> {
        Ok(self.jobs.read().get(&id).cloned())
    }

    async fn update_status(&self, id: Uuid, update: StatusUpdate) -> RegistryResult<StatusWrite> {
        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&id).ok_or(RegistryError::JobNotFound { id })?;

        if !update.precondition_holds(job.status) {
            return Ok(StatusWrite::Skipped {
                current: job.status,
            });
        }

        apply_update(job, &update)?;
        Ok(StatusWrite::Applied(job.clone()))
    }

    async fn increment_retry_count(&self, id: Uuid) -> RegistryResult<u32> {
        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&id).ok_or(RegistryError::JobNotFound { id })?;
        job.retry_count += 1;
        Ok(job.retry_count)
    }
}

/// Result store backed by a map; `upsert` replaces by job id.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: RwLock<HashMap<Uuid, EvaluationResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes every result to `path` as JSON.
    pub async fn persist(&self, path: &Path) -> RegistryResult<usize> {
        let mut results: Vec<EvaluationResult> = self.results.read().values().cloned().collect();
        results.sort_by_key(|result| result.created_at);
        persist_records(path, &results, "results").await
    }

    /// Loads results written by [`persist`](Self::persist). A missing file restores nothing.
    pub async fn restore(&self, path: &Path) -> RegistryResult<usize> {
        let results: Vec<EvaluationResult> = restore_records(path, "results").await?;
        let restored = results.len();
        let mut map = self.results.write();
        for result in results {
            map.insert(result.job_id, result);
        }
        Ok(restored)
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn upsert(&self, result: EvaluationResult) -> RegistryResult<()> {
        self.results.write().insert(result.job_id, result);
        Ok(())
    }

    async fn find_by_job_id(&self, job_id: Uuid) -> RegistryResult<Option<EvaluationResult>> {
        Ok(self.results.read().get(&job_id).cloned())
    }

    async fn remove(&self, job_id: Uuid) -> RegistryResult<bool> {
        Ok(self.results.write().remove(&job_id).is_some())
    }
}
