//! Public entry point for evaluation jobs.
//!
//! [`JobOrchestrator`] validates submissions, records them in the job registry and hands them
//! to the queue. Status queries merge the registry record with live queue progress.

mod error;


pub use error::{OrchestratorError, OrchestratorResult};

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::content::{ContentError, ContentProvider, DocumentKind};
use crate::queue::{
    EnqueueOutcome, EvaluationPayload, QueueStats, RemoveOutcome, TaskOptions, TaskQueue,
    TaskState,
};
use crate::registry::{
    EvaluationJob, EvaluationResult, JobStatus, JobStore, NewJob, ResultStore, StatusUpdate,
    StatusWrite,
};

/// Error message stored on a job cancelled by its submitter.
pub const CANCELLED_MESSAGE: &str = "Job cancelled by user";

/// Acknowledgement returned by create, retry and cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobTicket {
    pub id: Uuid,
    pub status: JobStatus,
}

/// Registry state merged with live queue state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_state: Option<TaskState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
}

pub struct JobOrchestrator {
    jobs: Arc<dyn JobStore>,
    results: Arc<dyn ResultStore>,
    contents: Arc<dyn ContentProvider>,
    queue: Arc<dyn TaskQueue>,
    task_options: Option<TaskOptions>,
}

impl JobOrchestrator {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        results: Arc<dyn ResultStore>,
        contents: Arc<dyn ContentProvider>,
        queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self {
            jobs,
            results,
            contents,
            queue,
            task_options: None,
        }
    }

    /// Options for every task this orchestrator enqueues. Queue defaults apply otherwise.
    pub fn task_options(mut self, options: TaskOptions) -> Self {
        self.task_options = Some(options);
        self
    }

    #[instrument(skip(self))]
    pub async fn create_job(
        &self,
        job_title: &str,
        cv_document_id: &str,
        project_document_id: &str,
    ) -> OrchestratorResult<JobTicket> {
        let job_title = job_title.trim();
        if job_title.is_empty() {
            return Err(OrchestratorError::Validation {
                reason: "job title must not be empty".to_string(),
            });
        }
        self.validate_document(cv_document_id, DocumentKind::Cv)
            .await?;
        self.validate_document(project_document_id, DocumentKind::ProjectReport)
            .await?;

        let job = self
            .jobs
            .create(NewJob::new(job_title, cv_document_id, project_document_id))
            .await?;
        self.enqueue(&job).await?;

        info!(job_id = %job.id, "Evaluation job queued");
        Ok(JobTicket {
            id: job.id,
            status: job.status,
        })
    }

    async fn validate_document(
        &self,
        document_id: &str,
        expected: DocumentKind,
    ) -> OrchestratorResult<()> {
        let content = match self.contents.find_by_document_id(document_id).await {
            Ok(content) => content,
            Err(ContentError::NotFound { .. }) => {
                return Err(OrchestratorError::Validation {
                    reason: format!("{} document '{document_id}' not found", expected.as_str()),
                });
            }
            Err(e) => {
                return Err(OrchestratorError::Persistence {
                    reason: e.to_string(),
                });
            }
        };

        if content.kind != expected {
            return Err(OrchestratorError::Validation {
                reason: format!(
                    "document '{document_id}' is a {}, expected {}",
                    content.kind.as_str(),
                    expected.as_str()
                ),
            });
        }
        if !content.is_extracted() {
            return Err(OrchestratorError::Extraction {
                document_id: document_id.to_string(),
                status: format!("{:?}", content.extraction_status).to_lowercase(),
            });
        }
        Ok(())
    }

    /// Enqueues the job's task. A job whose task cannot be queued is marked failed.
    async fn enqueue(&self, job: &EvaluationJob) -> OrchestratorResult<()> {
        let payload = EvaluationPayload {
            job_id: job.id,
            job_title: job.job_title.clone(),
            cv_document_id: job.cv_document_id.clone(),
            project_document_id: job.project_document_id.clone(),
        };

        match self.queue.enqueue(job.id, payload, self.task_options).await {
            Ok(EnqueueOutcome::Enqueued) => Ok(()),
            Ok(EnqueueOutcome::Duplicate) => {
                debug!(job_id = %job.id, "Task already live, not enqueued again");
                Ok(())
            }
            Err(e) => {
                let update = StatusUpdate::failed(format!("Could not queue job: {e}"));
                if let Err(write) = self.jobs.update_status(job.id, update).await {
                    warn!(job_id = %job.id, error = %write, "Could not mark unqueued job failed");
                }
                Err(e.into())
            }
        }
    }

    async fn find_job(&self, id: Uuid) -> OrchestratorResult<EvaluationJob> {
        self.jobs
            .find_by_id(id)
            .await?
            .ok_or(OrchestratorError::NotFound { id })
    }

    pub async fn get_result(&self, id: Uuid) -> OrchestratorResult<JobView> {
        let job = self.find_job(id).await?;

        let mut view = JobView {
            id: job.id,
            status: job.status,
            queue_state: None,
            progress: None,
            result: None,
            error: None,
            retry_count: None,
        };

        if let Some(task) = self.queue.get_task(id).await {
            view.queue_state = Some(task.state);
            if task.progress > 0 {
                view.progress = Some(task.progress);
            }
        }

        match job.status {
            JobStatus::Completed => view.result = self.results.find_by_job_id(id).await?,
            JobStatus::Failed => {
                view.error = job.error_message;
                view.retry_count = Some(job.retry_count);
            }
            JobStatus::Queued | JobStatus::Processing => {}
        }

        Ok(view)
    }

    /// Re-queues a failed job with its original payload.
    #[instrument(skip(self))]
    pub async fn retry_job(&self, id: Uuid) -> OrchestratorResult<JobTicket> {
        let job = self.find_job(id).await?;
        if job.status != JobStatus::Failed {
            return Err(OrchestratorError::InvalidState {
                id,
                status: job.status,
                reason: "only failed jobs can be retried",
            });
        }
        if self
            .queue
            .get_task(id)
            .await
            .is_some_and(|task| task.state == TaskState::Active)
        {
            return Err(OrchestratorError::InvalidState {
                id,
                status: job.status,
                reason: "a previous attempt is still running",
            });
        }

        let update = StatusUpdate::new(JobStatus::Queued).expecting(&[JobStatus::Failed]);
        let job = match self.jobs.update_status(id, update).await? {
            StatusWrite::Applied(job) => job,
            StatusWrite::Skipped { current } => {
                return Err(OrchestratorError::InvalidState {
                    id,
                    status: current,
                    reason: "only failed jobs can be retried",
                });
            }
        };
        self.enqueue(&job).await?;

        info!(job_id = %id, "Job re-queued");
        Ok(JobTicket {
            id,
            status: JobStatus::Queued,
        })
    }

    /// Removes a pending task and marks the job failed.
    ///
    /// A task already running is not preempted; its completion write is skipped because the
    /// job no longer reads `processing`.
    #[instrument(skip(self))]
    pub async fn cancel_job(&self, id: Uuid) -> OrchestratorResult<JobTicket> {
        let job = self.find_job(id).await?;
        if job.status == JobStatus::Completed {
            return Err(OrchestratorError::InvalidState {
                id,
                status: job.status,
                reason: "completed jobs cannot be cancelled",
            });
        }

        match self.queue.remove_task(id).await {
            RemoveOutcome::Removed => debug!(job_id = %id, "Pending task removed"),
            RemoveOutcome::Discarded => {
                info!(job_id = %id, "Task already running, it will not be retried")
            }
            RemoveOutcome::NotFound => {}
        }

        let update = StatusUpdate::failed(CANCELLED_MESSAGE).expecting(&[
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Failed,
        ]);
        if let StatusWrite::Skipped { current } = self.jobs.update_status(id, update).await? {
            return Err(OrchestratorError::InvalidState {
                id,
                status: current,
                reason: "completed jobs cannot be cancelled",
            });
        }

        info!(job_id = %id, "Job cancelled");
        Ok(JobTicket {
            id,
            status: JobStatus::Failed,
        })
    }

    pub async fn queue_stats(&self) -> QueueStats {
        self.queue.stats().await
    }
}
