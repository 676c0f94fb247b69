use std::path::PathBuf;
use std::time::Duration;

use super::model::TaskOptions;

/// Cap and age limit for terminal tasks of one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub max_count: u64,
    /// `None` keeps tasks regardless of age.
    pub max_age: Option<Duration>,
}

impl Retention {
    pub fn count(max_count: u64) -> Self {
        Self {
            max_count,
            max_age: None,
        }
    }

    pub fn max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Applied when `enqueue` gets no options.
    pub default_options: TaskOptions,
    pub completed_retention: Retention,
    pub failed_retention: Retention,
    /// Snapshot file used by the binary on start-up and shutdown.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_options: TaskOptions::default(),
            completed_retention: Retention::count(100).max_age(Duration::from_secs(24 * 60 * 60)),
            failed_retention: Retention::count(1000),
            snapshot_path: None,
        }
    }
}

impl QueueConfig {
    pub fn default_options(mut self, options: TaskOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn completed_retention(mut self, retention: Retention) -> Self {
        self.completed_retention = retention;
        self
    }

    pub fn failed_retention(mut self, retention: Retention) -> Self {
        self.failed_retention = retention;
        self
    }

    pub fn snapshot_path(mut self, path: Option<PathBuf>) -> Self {
        self.snapshot_path = path;
        self
    }
}
