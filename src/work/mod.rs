//! Synthetic work generator.
//!
//! Stands in for a database call or external API round-trip: a random,
//! bounded suspension that holds no locks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::Rng;

use crate::config::WorkConfig;

/// Timestamp layout used in work payloads, e.g. `2024-05-01T12:00:00+0000`.
const PROCESSED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Result of one unit of synthetic work.
#[derive(Debug, Clone)]
pub struct WorkReport {
    pub work_ms: u64,
    pub processed_at: String,
}

#[derive(Debug)]
pub struct SyntheticWork {
    min_ms: u64,
    max_ms: u64,
    performed: AtomicU64,
}

impl SyntheticWork {
    pub fn new(config: &WorkConfig) -> Self {
        Self {
            min_ms: config.min_ms,
            max_ms: config.max_ms.max(config.min_ms),
            performed: AtomicU64::new(0),
        }
    }

    /// Pick a duration in `[min_ms, max_ms]`.
    pub fn sample_ms(&self) -> u64 {
        rand::thread_rng().gen_range(self.min_ms..=self.max_ms)
    }

    pub async fn perform(&self) -> WorkReport {
        let work_ms = self.sample_ms();
        self.performed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(work_ms, "Performing synthetic work");

        tokio::time::sleep(Duration::from_millis(work_ms)).await;

        WorkReport {
            work_ms,
            processed_at: chrono::Local::now().format(PROCESSED_AT_FORMAT).to_string(),
        }
    }

    /// Number of units of work started so far.
    pub fn performed(&self) -> u64 {
        self.performed.load(Ordering::Relaxed)
    }
}
