use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::content::{ContentProvider, DocumentContent};
use crate::queue::{EvaluationPayload, QueueTask};
use crate::registry::{
    EvaluationResult, JobStatus, JobStore, ResultStore, StatusUpdate, StatusWrite,
};
use crate::scoring::heuristics::job_level_fallback;
use crate::scoring::{EvaluationOutcome, EvaluationStage, Scorer, ScoringMetadata};

use super::error::WorkerError;
use super::pool::{ProgressReporter, TaskProcessor};

/// Progress milestones outside the scoring pass.
pub mod milestones {
    pub const PROCESSING: u8 = 10;
    pub const CONTENT_LOADED: u8 = 20;
    pub const CONTENT_VALIDATED: u8 = 30;
    pub const PERSISTED: u8 = 90;
    pub const DONE: u8 = 100;
}

/// Drives one evaluation job from `queued` to `completed` or `failed`.
///
/// Status writes are conditional: `processing` only follows `queued` or `failed`, and the
/// final write only follows `processing`. A job cancelled mid-flight keeps its `failed` status.
pub struct EvaluationProcessor {
    jobs: Arc<dyn JobStore>,
    results: Arc<dyn ResultStore>,
    contents: Arc<dyn ContentProvider>,
    scorer: Arc<dyn Scorer>,
}

impl EvaluationProcessor {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        results: Arc<dyn ResultStore>,
        contents: Arc<dyn ContentProvider>,
        scorer: Arc<dyn Scorer>,
    ) -> Self {
        Self {
            jobs,
            results,
            contents,
            scorer,
        }
    }

    async fn load_content(&self, document_id: &str) -> Result<DocumentContent, WorkerError> {
        let content = self.contents.find_by_document_id(document_id).await?;
        if !content.is_extracted() {
            return Err(WorkerError::NotExtracted {
                document_id: document_id.to_string(),
                status: format!("{:?}", content.extraction_status).to_lowercase(),
            });
        }
        Ok(content)
    }

    async fn run(
        &self,
        payload: &EvaluationPayload,
        progress: &ProgressReporter,
    ) -> Result<(), WorkerError> {
        let job_id = payload.job_id;

        let cv = self.load_content(&payload.cv_document_id).await?;
        let project = self.load_content(&payload.project_document_id).await?;
        progress.report(milestones::CONTENT_LOADED);
        progress.report(milestones::CONTENT_VALIDATED);

        let on_stage = |stage: EvaluationStage| progress.report(stage.percent());
        let outcome = match self
            .scorer
            .evaluate(&payload.job_title, &cv, &project, &on_stage)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%job_id, error = %e, "Scoring failed, storing fallback evaluation");
                let (cv, project, overall_summary) = job_level_fallback(&cv, &project);
                EvaluationOutcome {
                    cv,
                    project,
                    overall_summary,
                    metadata: ScoringMetadata::job_level_fallback(),
                }
            }
        };

        if let Some(current) = self.superseded(job_id).await? {
            warn!(%job_id, status = %current, "Job changed while processing, result discarded");
            return Ok(());
        }

        self.results
            .upsert(EvaluationResult::from_outcome(job_id, outcome))
            .await?;
        progress.report(milestones::PERSISTED);

        let update = StatusUpdate::new(JobStatus::Completed).expecting(&[JobStatus::Processing]);
        match self.jobs.update_status(job_id, update).await? {
            StatusWrite::Applied(_) => {
                progress.report(milestones::DONE);
                info!(%job_id, "Evaluation completed");
            }
            StatusWrite::Skipped { current } => {
                // Only completed jobs keep a result.
                self.results.remove(job_id).await?;
                warn!(%job_id, status = %current, "Job changed while processing, completion not recorded");
            }
        }
        Ok(())
    }

    /// The job's status when something other than this attempt moved it out of `processing`.
    async fn superseded(&self, job_id: Uuid) -> Result<Option<JobStatus>, WorkerError> {
        match self.jobs.find_by_id(job_id).await? {
            Some(job) if job.status == JobStatus::Processing => Ok(None),
            Some(job) => Ok(Some(job.status)),
            None => Err(WorkerError::JobNotFound { id: job_id }),
        }
    }

    async fn record_failure(&self, job_id: Uuid, error: &WorkerError) {
        let update = StatusUpdate::failed(error.to_string()).expecting(&[JobStatus::Processing]);
        match self.jobs.update_status(job_id, update).await {
            Ok(StatusWrite::Applied(_)) => {
                if let Err(e) = self.jobs.increment_retry_count(job_id).await {
                    warn!(%job_id, error = %e, "Could not increment retry count");
                }
            }
            Ok(StatusWrite::Skipped { current }) => {
                warn!(%job_id, status = %current, "Job changed while processing, failure not recorded");
            }
            Err(e) => warn!(%job_id, error = %e, "Could not mark job failed"),
        }
    }
}

#[async_trait]
impl TaskProcessor for EvaluationProcessor {
    #[instrument(skip_all, fields(job_id = %task.payload.job_id, attempt = task.attempts_made + 1))]
    async fn process(
        &self,
        task: &QueueTask,
        progress: &ProgressReporter,
    ) -> Result<(), WorkerError> {
        let job_id = task.payload.job_id;

        let update = StatusUpdate::new(JobStatus::Processing)
            .expecting(&[JobStatus::Queued, JobStatus::Failed]);
        match self.jobs.update_status(job_id, update).await {
            Ok(StatusWrite::Applied(_)) => {}
            Ok(StatusWrite::Skipped { current }) => {
                info!(%job_id, status = %current, "Job not runnable, skipping task");
                return Ok(());
            }
            Err(crate::registry::RegistryError::JobNotFound { id }) => {
                return Err(WorkerError::JobNotFound { id });
            }
            Err(e) => return Err(e.into()),
        }
        progress.report(milestones::PROCESSING);

        let result = self.run(&task.payload, progress).await;
        if let Err(e) = &result {
            self.record_failure(job_id, e).await;
        }
        result
    }
}
