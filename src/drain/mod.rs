//! Drain coordination subsystem.
//!
//! # Data Flow
//! ```text
//! TerminationSequencer (lifecycle)
//!     → coordinator.rs begin_drain()   (single writer)
//!
//! HealthReporter, leaf and relay handlers
//!     → coordinator.rs query()         (many readers, wait-free)
//! ```
//!
//! # Design Decisions
//! - One coordinator per process, injected via `Arc`, never a global
//! - State is monotonic: Draining is terminal
//! - No error path: a transition either happens or was already done

pub mod coordinator;

pub use coordinator::{DrainCoordinator, DrainState};
