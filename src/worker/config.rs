use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Tasks processed at once.
    pub concurrency: usize,
    /// Task starts allowed per `window`.
    pub max_starts_per_window: u32,
    pub window: Duration,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            max_starts_per_window: 10,
            window: Duration::from_secs(1),
            event_capacity: 256,
        }
    }
}

impl WorkerConfig {
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn max_starts_per_window(mut self, max_starts: u32) -> Self {
        self.max_starts_per_window = max_starts.max(1);
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}
