//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator probe (GET /health)
//!     → reporter.rs (query DrainCoordinator)
//!     → 200 "ok" | 503 "draining"
//! ```
//!
//! # Design Decisions
//! - No state of its own; the drain flag is the only input
//! - The probe is how the routing layer learns to stop sending traffic, so it
//!   must stay 200 for the whole convergence window

pub mod reporter;

pub use reporter::{HealthReport, HealthReporter};
