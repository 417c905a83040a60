use std::time::Instant;

use crate::TaskTracker;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub tracker: TaskTracker,
    /// Server start time for uptime reporting
    pub start_time: Instant,
}

impl AppState {
    pub fn new(tracker: TaskTracker) -> Self {
        Self {
            tracker,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
