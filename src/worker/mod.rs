//! Worker pool driving queued evaluation tasks.
//!
//! [`WorkerPool`] runs up to `concurrency` tasks at once and throttles task starts with a
//! sliding window. Lifecycle changes are broadcast as [`WorkerEvent`]s.

mod config;
mod error;
mod events;
mod limiter;
mod pool;
mod processor;


pub use config::WorkerConfig;
pub use error::WorkerError;
pub use events::{WorkerEvent, log_event};
pub use limiter::StartLimiter;
pub use pool::{ProgressReporter, TaskProcessor, WorkerPool};
pub use processor::{EvaluationProcessor, milestones};
