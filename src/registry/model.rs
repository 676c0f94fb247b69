use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::{CvEvaluation, EvaluationOutcome, ProjectEvaluation, ScoringMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle record of one evaluation request.
///
/// `completed_at` is set iff the job is completed; `error_message` is set iff it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationJob {
    pub id: Uuid,
    pub job_title: String,
    pub cv_document_id: String,
    pub project_document_id: String,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when a job is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub job_title: String,
    pub cv_document_id: String,
    pub project_document_id: String,
}

impl NewJob {
    pub fn new(
        job_title: impl Into<String>,
        cv_document_id: impl Into<String>,
        project_document_id: impl Into<String>,
    ) -> Self {
        Self {
            job_title: job_title.into(),
            cv_document_id: cv_document_id.into(),
            project_document_id: project_document_id.into(),
        }
    }
}

/// A status write, optionally conditional on the current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: JobStatus,
    pub error_message: Option<String>,
    /// Apply only when the current status is one of these.
    pub expected: Option<Vec<JobStatus>>,
}

impl StatusUpdate {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            error_message: None,
            expected: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(JobStatus::Failed).with_error(message)
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn expecting(mut self, statuses: &[JobStatus]) -> Self {
        self.expected = Some(statuses.to_vec());
        self
    }

    pub fn precondition_holds(&self, current: JobStatus) -> bool {
        self.expected
            .as_ref()
            .is_none_or(|expected| expected.contains(&current))
    }
}

/// Outcome of a status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusWrite {
    Applied(EvaluationJob),
    /// The precondition did not hold; nothing was written.
    Skipped { current: JobStatus },
}

impl StatusWrite {
    pub fn is_applied(&self) -> bool {
        matches!(self, StatusWrite::Applied(_))
    }
}

/// Scores and summary stored for a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub job_id: Uuid,
    #[serde(flatten)]
    pub cv: CvEvaluation,
    #[serde(flatten)]
    pub project: ProjectEvaluation,
    pub overall_summary: String,
    #[serde(flatten)]
    pub metadata: ScoringMetadata,
    pub created_at: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn from_outcome(job_id: Uuid, outcome: EvaluationOutcome) -> Self {
        Self {
            job_id,
            cv: outcome.cv,
            project: outcome.project,
            overall_summary: outcome.overall_summary,
            metadata: outcome.metadata,
            created_at: Utc::now(),
        }
    }
}
