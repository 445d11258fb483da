//! In-flight work tracking.
//!
//! # Responsibilities
//! - Count admitted units of work that have not returned yet
//! - Report the count when the termination signal arrives

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Shared counter of admitted, unfinished requests.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly admitted request. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_inflight(now);
        InFlightGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard for one in-flight request.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_inflight(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_balance_the_count() {
        let tracker = InFlightTracker::new();
        assert_eq!(tracker.count(), 0);

        let a = tracker.track();
        let b = tracker.track();
        assert_eq!(tracker.count(), 2);

        drop(a);
        assert_eq!(tracker.count(), 1);
        drop(b);
        assert_eq!(tracker.count(), 0);
    }
}
