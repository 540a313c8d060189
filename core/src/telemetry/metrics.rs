use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Counters accumulated over the life of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub evaluations: u64,
    pub feed_failures: u64,
    pub notifications: u64,
    pub aborted_sequences: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_tick(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.ticks += 1;
        }
    }

    pub fn record_evaluation(&self, failed: bool) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.evaluations += 1;
            if failed {
                metrics.feed_failures += 1;
            }
        }
    }

    pub fn record_notification(&self, started: bool) {
        if let Ok(mut metrics) = self.inner.lock() {
            if started {
                metrics.notifications += 1;
            } else {
                metrics.aborted_sequences += 1;
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
