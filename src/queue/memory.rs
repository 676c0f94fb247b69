use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::{QueueConfig, Retention};
use super::error::{QueueError, QueueResult};
use super::model::{
    EnqueueOutcome, EvaluationPayload, FailOutcome, QueueStats, QueueTask, RemoveOutcome,
    TaskOptions, TaskState, TaskView,
};
use super::TaskQueue;

#[derive(Default)]
struct LiveTasks {
    tasks: HashMap<Uuid, QueueTask>,
    /// Ordered by (priority, insertion sequence).
    waiting: BTreeSet<(u32, u64, Uuid)>,
    delayed: HashMap<Uuid, Instant>,
    next_seq: u64,
    paused: bool,
    closed: bool,
}

impl LiveTasks {
    fn push_waiting(&mut self, mut task: QueueTask) {
        self.next_seq += 1;
        task.seq = self.next_seq;
        task.state = TaskState::Waiting;
        self.waiting.insert((task.options.priority, task.seq, task.id));
        self.tasks.insert(task.id, task);
    }

    fn promote_due(&mut self, now: Instant) {
        let due: Vec<Uuid> = self
            .delayed
            .iter()
            .filter(|(_, ready_at)| **ready_at <= now)
            .map(|(id, _)| *id)
            .collect();

        for id in due {
            self.delayed.remove(&id);
            if let Some(task) = self.tasks.remove(&id) {
                self.push_waiting(task);
            }
        }
    }

    fn pop_waiting(&mut self) -> Option<QueueTask> {
        let (_, _, id) = self.waiting.pop_first()?;
        let task = self.tasks.get_mut(&id)?;
        task.state = TaskState::Active;
        task.processed_at = Some(Utc::now());
        Some(task.clone())
    }

    fn next_ready_at(&self) -> Option<Instant> {
        self.delayed.values().min().copied()
    }

    fn take_active(&mut self, id: Uuid) -> QueueResult<QueueTask> {
        match self.tasks.get(&id).map(|t| t.state) {
            Some(TaskState::Active) => self.tasks.remove(&id).ok_or(QueueError::TaskNotFound { id }),
            Some(state) => Err(QueueError::NotActive { id, state }),
            None => Err(QueueError::TaskNotFound { id }),
        }
    }

    fn count(&self, state: TaskState) -> u64 {
        self.tasks.values().filter(|t| t.state == state).count() as u64
    }
}

fn retention_cache(retention: Retention) -> Cache<Uuid, QueueTask> {
    let builder = Cache::builder()
        .max_capacity(retention.max_count)
        .eviction_policy(EvictionPolicy::lru());
    match retention.max_age {
        Some(age) => builder.time_to_live(age).build(),
        None => builder.build(),
    }
}

/// In-process task queue with priorities, retries with backoff and bounded retention.
///
/// Live tasks sit behind one mutex; finished tasks move to size- and age-bounded caches.
/// Consumers block in [`next_task`](Self::next_task) until a task is ready or the queue closes.
pub struct MemoryQueue {
    live: Mutex<LiveTasks>,
    completed: Cache<Uuid, QueueTask>,
    failed: Cache<Uuid, QueueTask>,
    notify: Notify,
    config: QueueConfig,
}

impl MemoryQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            live: Mutex::new(LiveTasks::default()),
            completed: retention_cache(config.completed_retention),
            failed: retention_cache(config.failed_retention),
            notify: Notify::new(),
            config,
        }
    }

    pub fn shared(config: QueueConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Adds a task unless a live task with the same id exists.
    ///
    /// A finished task with the same id is replaced, so a failed job can be re-enqueued.
    pub fn enqueue(
        &self,
        id: Uuid,
        payload: EvaluationPayload,
        options: Option<TaskOptions>,
    ) -> QueueResult<EnqueueOutcome> {
        let mut live = self.live.lock();
        if live.closed {
            return Err(QueueError::Closed);
        }
        if live.tasks.contains_key(&id) {
            debug!(task_id = %id, "Task already queued");
            return Ok(EnqueueOutcome::Duplicate);
        }

        self.completed.invalidate(&id);
        self.failed.invalidate(&id);

        live.push_waiting(QueueTask {
            id,
            payload,
            options: options.unwrap_or(self.config.default_options),
            state: TaskState::Waiting,
            attempts_made: 0,
            progress: 0,
            last_error: None,
            discarded: false,
            created_at: Utc::now(),
            processed_at: None,
            finished_at: None,
            seq: 0,
        });
        drop(live);

        self.notify.notify_waiters();
        debug!(task_id = %id, "Task enqueued");
        Ok(EnqueueOutcome::Enqueued)
    }

    /// Waits for the next ready task and marks it active. `None` once the queue is closed.
    pub async fn next_task(&self) -> Option<QueueTask> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let wake_at = {
                let mut live = self.live.lock();
                if live.closed {
                    return None;
                }
                live.promote_due(Instant::now());
                if !live.paused {
                    if let Some(task) = live.pop_waiting() {
                        return Some(task);
                    }
                }
                live.next_ready_at()
            };

            match wake_at {
                Some(deadline) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = tokio::time::sleep_until(deadline) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    pub fn update_progress(&self, id: Uuid, progress: u8) -> QueueResult<()> {
        let mut live = self.live.lock();
        let task = live
            .tasks
            .get_mut(&id)
            .ok_or(QueueError::TaskNotFound { id })?;
        task.progress = progress.min(100);
        Ok(())
    }

    /// Marks an active task completed.
    pub fn complete(&self, id: Uuid) -> QueueResult<()> {
        let mut task = self.live.lock().take_active(id)?;
        task.state = TaskState::Completed;
        task.progress = 100;
        task.finished_at = Some(Utc::now());
        self.completed.insert(id, task);
        Ok(())
    }

    /// Records a failed attempt and schedules a retry while attempts remain.
    pub fn fail(&self, id: Uuid, error: &str) -> QueueResult<FailOutcome> {
        let mut live = self.live.lock();
        let mut task = live.take_active(id)?;
        task.attempts_made += 1;
        task.last_error = Some(error.to_string());

        if !task.discarded && task.attempts_made < task.options.attempts {
            let delay = task.options.backoff.delay_for(task.attempts_made);
            let attempt = task.attempts_made + 1;
            task.state = TaskState::Delayed;
            live.delayed.insert(id, Instant::now() + delay);
            live.tasks.insert(id, task);
            drop(live);

            self.notify.notify_waiters();
            debug!(task_id = %id, attempt, delay_ms = delay.as_millis() as u64, "Task scheduled for retry");
            return Ok(FailOutcome::Retrying { delay, attempt });
        }
        drop(live);

        let outcome = if task.discarded {
            FailOutcome::Discarded
        } else {
            FailOutcome::Exhausted
        };
        task.state = TaskState::Failed;
        task.finished_at = Some(Utc::now());
        self.failed.insert(id, task);
        Ok(outcome)
    }

    pub fn get_task(&self, id: Uuid) -> Option<TaskView> {
        if let Some(task) = self.live.lock().tasks.get(&id) {
            return Some(task.view());
        }
        self.completed
            .get(&id)
            .or_else(|| self.failed.get(&id))
            .map(|task| task.view())
    }

    /// Removes a task. Active tasks are only marked discarded.
    pub fn remove_task(&self, id: Uuid) -> RemoveOutcome {
        let mut live = self.live.lock();
        match live.tasks.get(&id).map(|t| t.state) {
            Some(TaskState::Active) => {
                if let Some(task) = live.tasks.get_mut(&id) {
                    task.discarded = true;
                }
                RemoveOutcome::Discarded
            }
            Some(_) => {
                if let Some(task) = live.tasks.remove(&id) {
                    live.waiting
                        .remove(&(task.options.priority, task.seq, task.id));
                }
                live.delayed.remove(&id);
                RemoveOutcome::Removed
            }
            None => {
                drop(live);
                if self.completed.remove(&id).is_some() || self.failed.remove(&id).is_some() {
                    RemoveOutcome::Removed
                } else {
                    RemoveOutcome::NotFound
                }
            }
        }
    }

    pub fn stats(&self) -> QueueStats {
        self.completed.run_pending_tasks();
        self.failed.run_pending_tasks();

        let live = self.live.lock();
        let waiting = live.count(TaskState::Waiting);
        let active = live.count(TaskState::Active);
        let delayed = live.count(TaskState::Delayed);
        let completed = self.completed.entry_count();
        let failed = self.failed.entry_count();

        QueueStats {
            waiting,
            active,
            completed,
            failed,
            delayed,
            total: waiting + active + delayed + completed + failed,
            paused: live.paused,
        }
    }

    /// Stops handing out tasks. Enqueueing still works.
    pub fn pause(&self) {
        self.live.lock().paused = true;
        info!("Queue paused");
    }

    pub fn resume(&self) {
        self.live.lock().paused = false;
        self.notify.notify_waiters();
        info!("Queue resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.live.lock().paused
    }

    /// Removes up to `limit` finished tasks in `state` that finished at least `grace` ago,
    /// oldest first. Returns the removed ids.
    pub fn clean(
        &self,
        grace: std::time::Duration,
        limit: usize,
        state: TaskState,
    ) -> QueueResult<Vec<Uuid>> {
        let cache = match state {
            TaskState::Completed => &self.completed,
            TaskState::Failed => &self.failed,
            other => return Err(QueueError::NotTerminal { state: other }),
        };

        let Some(cutoff) = chrono::Duration::from_std(grace)
            .ok()
            .and_then(|grace| Utc::now().checked_sub_signed(grace))
        else {
            return Ok(Vec::new());
        };
        let mut candidates: Vec<(chrono::DateTime<Utc>, Uuid)> = cache
            .iter()
            .filter_map(|(id, task)| {
                let finished = task.finished_at?;
                (finished <= cutoff).then_some((finished, *id))
            })
            .collect();
        candidates.sort();
        candidates.truncate(limit);

        let removed: Vec<Uuid> = candidates.into_iter().map(|(_, id)| id).collect();
        for id in &removed {
            cache.invalidate(id);
        }
        debug!(count = removed.len(), state = %state, "Cleaned finished tasks");
        Ok(removed)
    }

    /// Stops handing out tasks and wakes every waiting consumer.
    pub fn close(&self) {
        self.live.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.live.lock().closed
    }

    /// Writes unfinished tasks to `path` as JSON. Returns how many were written.
    pub async fn persist(&self, path: &Path) -> QueueResult<usize> {
        let mut tasks: Vec<QueueTask> = self.live.lock().tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.seq);

        let json = serde_json::to_vec_pretty(&tasks)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;

        info!(path = %path.display(), tasks = tasks.len(), "Queue snapshot written");
        Ok(tasks.len())
    }

    /// Loads tasks written by [`persist`](Self::persist). Every restored task is waiting,
    /// including ones that were active or delayed. A missing file restores nothing.
    pub async fn restore(&self, path: &Path) -> QueueResult<usize> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let tasks: Vec<QueueTask> = serde_json::from_slice(&bytes)?;

        let mut restored = 0;
        {
            let mut live = self.live.lock();
            for mut task in tasks {
                if live.tasks.contains_key(&task.id) {
                    warn!(task_id = %task.id, "Skipping duplicate task in snapshot");
                    continue;
                }
                task.progress = 0;
                task.discarded = false;
                live.push_waiting(task);
                restored += 1;
            }
        }

        self.notify.notify_waiters();
        info!(path = %path.display(), restored, "Queue snapshot restored");
        Ok(restored)
    }
}

#[async_trait]
impl TaskQueue for MemoryQueue {
    async fn enqueue(
        &self,
        id: Uuid,
        payload: EvaluationPayload,
        options: Option<TaskOptions>,
    ) -> QueueResult<EnqueueOutcome> {
        MemoryQueue::enqueue(self, id, payload, options)
    }

    async fn next_task(&self) -> Option<QueueTask> {
        MemoryQueue::next_task(self).await
    }

    fn update_progress(&self, id: Uuid, progress: u8) -> QueueResult<()> {
        MemoryQueue::update_progress(self, id, progress)
    }

    async fn complete(&self, id: Uuid) -> QueueResult<()> {
        MemoryQueue::complete(self, id)
    }

    async fn fail(&self, id: Uuid, error: &str) -> QueueResult<FailOutcome> {
        MemoryQueue::fail(self, id, error)
    }

    async fn get_task(&self, id: Uuid) -> Option<TaskView> {
        MemoryQueue::get_task(self, id)
    }

    async fn remove_task(&self, id: Uuid) -> RemoveOutcome {
        MemoryQueue::remove_task(self, id)
    }

    async fn stats(&self) -> QueueStats {
        MemoryQueue::stats(self)
    }

    fn close(&self) {
        MemoryQueue::close(self)
    }
}
