//! Progress logging for long scans.
//!
//! The tracker keeps an atomic count and writes a log line whenever the count
//! crosses an interval boundary. It never feeds back into the pipeline.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe progress tracker for logging progress at regular intervals.
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Create a tracker with the default interval of 100,000 items.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            interval: 100_000,
            message: message.into(),
            count: AtomicU64::new(0),
        }
    }

    /// Set the logging interval. An interval of zero is treated as one.
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Add to the count and log once per interval boundary crossed.
    ///
    /// Returns the number of boundaries crossed by this call.
    pub fn record(&self, additional: u64) -> u64 {
        if additional == 0 {
            return 0;
        }

        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        let new_count = prev + additional;

        let prev_intervals = prev / self.interval;
        let new_intervals = new_count / self.interval;
        for i in (prev_intervals + 1)..=new_intervals {
            info!("{} {}", self.message, i * self.interval);
        }
        new_intervals - prev_intervals
    }

    /// Current count.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Log the final count.
    pub fn finish(&self) {
        info!("{} {} (complete)", self.message, self.count());
    }
}
