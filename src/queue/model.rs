use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delay before a failed task is attempted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum BackoffPolicy {
    Fixed { delay: Duration },
    /// `base * 2^(attempt - 1)`.
    Exponential { base: Duration },
}

impl BackoffPolicy {
    /// Delay after the failed `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            BackoffPolicy::Fixed { delay } => *delay,
            BackoffPolicy::Exponential { base } => {
                let exponent = attempt.saturating_sub(1).min(16);
                base.saturating_mul(1u32 << exponent)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOptions {
    /// Lower is served first.
    pub priority: u32,
    /// Total attempts before the task is failed for good.
    pub attempts: u32,
    pub backoff: BackoffPolicy,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            priority: 1,
            attempts: 3,
            backoff: BackoffPolicy::Exponential {
                base: Duration::from_millis(2000),
            },
        }
    }
}

impl TaskOptions {
    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Waiting,
    Active,
    Delayed,
    Completed,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Waiting => "waiting",
            TaskState::Active => "active",
            TaskState::Delayed => "delayed",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work item carried by an evaluation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPayload {
    pub job_id: Uuid,
    pub job_title: String,
    pub cv_document_id: String,
    pub project_document_id: String,
}

/// A queued unit of work, keyed by its job id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueTask {
    pub id: Uuid,
    pub payload: EvaluationPayload,
    pub options: TaskOptions,
    pub state: TaskState,
    /// Failed attempts so far.
    pub attempts_made: u32,
    pub progress: u8,
    pub last_error: Option<String>,
    /// Removed while active; the running attempt finishes but is never redelivered.
    #[serde(default)]
    pub discarded: bool,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl QueueTask {
    pub fn view(&self) -> TaskView {
        TaskView {
            id: self.id,
            state: self.state,
            progress: self.progress,
            attempts_made: self.attempts_made,
            priority: self.options.priority,
            last_error: self.last_error.clone(),
        }
    }
}

/// Read-only snapshot of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub id: Uuid,
    pub state: TaskState,
    pub progress: u8,
    pub attempts_made: u32,
    pub priority: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnqueueOutcome {
    Enqueued,
    /// A live task with this id already exists; nothing was added.
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// Scheduled again after `delay`; `attempt` is the upcoming attempt number.
    Retrying { delay: Duration, attempt: u32 },
    /// Out of attempts; the task is failed.
    Exhausted,
    /// The task was removed while running and is failed without retry.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// Active task marked discarded; the running attempt is not preempted.
    Discarded,
    NotFound,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub waiting: u64,
    pub active: u64,
    pub completed: u64,
    pub failed: u64,
    pub delayed: u64,
    pub total: u64,
    pub paused: bool,
}
