use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::queue::{FailOutcome, QueueTask, TaskQueue};

use super::config::WorkerConfig;
use super::error::WorkerError;
use super::events::WorkerEvent;
use super::limiter::StartLimiter;

/// Executes one delivered task. An `Err` is reported to the queue as a failed attempt.
#[async_trait]
pub trait TaskProcessor: Send + Sync {
    async fn process(&self, task: &QueueTask, progress: &ProgressReporter)
    -> Result<(), WorkerError>;
}

/// Publishes progress of a running task to the queue and to event subscribers.
#[derive(Clone)]
pub struct ProgressReporter {
    task_id: Uuid,
    queue: Arc<dyn TaskQueue>,
    events: broadcast::Sender<WorkerEvent>,
}

impl ProgressReporter {
    pub fn new(
        task_id: Uuid,
        queue: Arc<dyn TaskQueue>,
        events: broadcast::Sender<WorkerEvent>,
    ) -> Self {
        Self {
            task_id,
            queue,
            events,
        }
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn report(&self, progress: u8) {
        if let Err(e) = self.queue.update_progress(self.task_id, progress) {
            debug!(task_id = %self.task_id, error = %e, "Progress update dropped");
            return;
        }
        let _ = self.events.send(WorkerEvent::Progress {
            task_id: self.task_id,
            progress,
        });
    }
}

/// Bounded-concurrency consumers of a [`TaskQueue`].
///
/// A dispatcher pulls tasks while a concurrency permit is free and the start rate allows,
/// then runs each on its own tokio task.
pub struct WorkerPool {
    cancel: CancellationToken,
    dispatcher: JoinHandle<()>,
    permits: Arc<Semaphore>,
    events: broadcast::Sender<WorkerEvent>,
    config: WorkerConfig,
}

impl WorkerPool {
    pub fn spawn(
        queue: Arc<dyn TaskQueue>,
        processor: Arc<dyn TaskProcessor>,
        config: WorkerConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let permits = Arc::new(Semaphore::new(config.concurrency));
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let limiter = Arc::new(StartLimiter::new(config.max_starts_per_window, config.window));

        let dispatcher = tokio::spawn(dispatch(
            queue,
            processor,
            Arc::clone(&permits),
            limiter,
            events.clone(),
            cancel.clone(),
        ));

        info!(
            concurrency = config.concurrency,
            max_starts_per_window = config.max_starts_per_window,
            "Worker pool started"
        );

        Self {
            cancel,
            dispatcher,
            permits,
            events,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.events.subscribe()
    }

    /// Stops taking new tasks and waits for in-flight ones to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.dispatcher.await {
            warn!(error = %e, "Dispatcher ended abnormally");
        }

        let all = u32::try_from(self.config.concurrency).unwrap_or(u32::MAX);
        match self.permits.acquire_many(all).await {
            Ok(_) => info!("Worker pool stopped"),
            Err(e) => warn!(error = %e, "Worker pool semaphore closed"),
        }
    }
}

async fn dispatch(
    queue: Arc<dyn TaskQueue>,
    processor: Arc<dyn TaskProcessor>,
    permits: Arc<Semaphore>,
    limiter: Arc<StartLimiter>,
    events: broadcast::Sender<WorkerEvent>,
    cancel: CancellationToken,
) {
    loop {
        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        // Throttle before dequeuing so a task only turns active when it actually starts.
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = limiter.ready() => {}
        }

        let task = tokio::select! {
            _ = cancel.cancelled() => break,
            task = queue.next_task() => match task {
                Some(task) => task,
                None => break,
            },
        };
        limiter.record();

        let queue = Arc::clone(&queue);
        let processor = Arc::clone(&processor);
        let events = events.clone();
        tokio::spawn(async move {
            run_task(queue, processor, events, task).await;
            drop(permit);
        });
    }
    debug!("Dispatcher stopped");
}

async fn run_task(
    queue: Arc<dyn TaskQueue>,
    processor: Arc<dyn TaskProcessor>,
    events: broadcast::Sender<WorkerEvent>,
    task: QueueTask,
) {
    let task_id = task.id;
    let _ = events.send(WorkerEvent::Started {
        task_id,
        attempt: task.attempts_made + 1,
    });

    let reporter = ProgressReporter::new(task_id, Arc::clone(&queue), events.clone());
    match processor.process(&task, &reporter).await {
        Ok(()) => {
            if let Err(e) = queue.complete(task_id).await {
                warn!(%task_id, error = %e, "Could not mark task completed");
            }
            let _ = events.send(WorkerEvent::Completed { task_id });
        }
        Err(error) => {
            let message = error.to_string();
            let will_retry = match queue.fail(task_id, &message).await {
                Ok(FailOutcome::Retrying { .. }) => true,
                Ok(FailOutcome::Exhausted | FailOutcome::Discarded) => false,
                Err(e) => {
                    warn!(%task_id, error = %e, "Could not record task failure");
                    false
                }
            };
            let _ = events.send(WorkerEvent::Failed {
                task_id,
                error: message,
                will_retry,
            });
        }
    }
}
