use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Sliding-window log limiter: at most `max_starts` acquisitions in any `window`.
#[derive(Debug)]
pub struct StartLimiter {
    max_starts: usize,
    window: Duration,
    starts: Mutex<VecDeque<Instant>>,
}

impl StartLimiter {
    pub fn new(max_starts: u32, window: Duration) -> Self {
        Self {
            max_starts: max_starts.max(1) as usize,
            window,
            starts: Mutex::new(VecDeque::new()),
        }
    }

    /// Drops expired starts. Returns when the next slot frees up, or `None` if one is free now.
    fn next_free_at(&self, starts: &mut VecDeque<Instant>, now: Instant) -> Option<Instant> {
        while starts
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
        {
            starts.pop_front();
        }

        if starts.len() < self.max_starts {
            return None;
        }
        starts.front().map(|oldest| *oldest + self.window)
    }

    /// Waits until a start would be allowed, without recording one.
    ///
    /// With a single caller, the slot stays free until [`record`](Self::record): starts
    /// only leave the window as time passes.
    pub async fn ready(&self) {
        loop {
            let free_at = {
                let mut starts = self.starts.lock();
                self.next_free_at(&mut starts, Instant::now())
            };
            match free_at {
                None => return,
                Some(at) => tokio::time::sleep_until(at).await,
            }
        }
    }

    /// Records a start at the current instant.
    pub fn record(&self) {
        self.starts.lock().push_back(Instant::now());
    }

    /// Waits until a start is allowed and records it.
    pub async fn acquire(&self) {
        loop {
            let now = Instant::now();
            let free_at = {
                let mut starts = self.starts.lock();
                let free_at = self.next_free_at(&mut starts, now);
                if free_at.is_none() {
                    starts.push_back(now);
                }
                free_at
            };
            match free_at {
                None => return,
                Some(at) => tokio::time::sleep_until(at).await,
            }
        }
    }
}
