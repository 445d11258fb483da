//! Process-wide drain state.
//!
//! # State Transitions
//! ```text
//! Active → Draining: first begin_drain() call
//! Draining → (none): terminal for the lifetime of the process
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Whether this instance still accepts new work.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Active = 0,
    Draining = 1,
}

impl From<u8> for DrainState {
    fn from(val: u8) -> Self {
        match val {
            0 => DrainState::Active,
            _ => DrainState::Draining,
        }
    }
}

/// Owner of the drain flag, shared by every handler of one instance.
///
/// Reads are a single atomic load. The transition is a compare-exchange, so
/// any number of concurrent `begin_drain` calls produce exactly one
/// `Active → Draining` change.
#[derive(Debug, Default)]
pub struct DrainCoordinator {
    state: AtomicU8,
}

impl DrainCoordinator {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(DrainState::Active as u8),
        }
    }

    /// Convenience constructor for sharing across handlers.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Current state. Never blocks.
    pub fn query(&self) -> DrainState {
        DrainState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_draining(&self) -> bool {
        self.query() == DrainState::Draining
    }

    /// Move to `Draining`. Returns `true` only for the call that performed
    /// the transition; every other call is a no-op.
    pub fn begin_drain(&self) -> bool {
        let won = self
            .state
            .compare_exchange(
                DrainState::Active as u8,
                DrainState::Draining as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if won {
            metrics::record_drain_transition();
        }
        won
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_active() {
        let coordinator = DrainCoordinator::new();
        assert_eq!(coordinator.query(), DrainState::Active);
        assert!(!coordinator.is_draining());
    }

    #[test]
    fn transition_is_monotonic() {
        let coordinator = DrainCoordinator::new();
        assert!(coordinator.begin_drain());
        for _ in 0..100 {
            assert!(!coordinator.begin_drain());
            assert_eq!(coordinator.query(), DrainState::Draining);
        }
    }

    #[test]
    fn concurrent_setters_coalesce() {
        let coordinator = DrainCoordinator::shared();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let c = Arc::clone(&coordinator);
                std::thread::spawn(move || c.begin_drain())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert!(coordinator.is_draining());
    }
}
