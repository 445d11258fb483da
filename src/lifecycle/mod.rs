//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Pre-stop hook (GET /prestop):
//!     sequencer.rs: Idle → Converging → (convergence delay) → Drained
//!                   └─ begin_drain() on entering Drained
//!
//! Termination signal (signals.rs: SIGTERM/SIGINT):
//!     startup.rs → sequencer.rs (ensure drained)
//!               → shutdown.rs (stop accepting, finish in-flight)
//!               → exit 0
//! ```
//!
//! # Design Decisions
//! - "Stop receiving traffic" (convergence + drain) is decoupled from
//!   "process exit", so the process never dies before routing converges
//! - Shutdown has a timeout: forced exit after the grace period
//! - In-flight work is counted (inflight.rs) and reported at termination

pub mod inflight;
pub mod sequencer;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use inflight::InFlightTracker;
pub use sequencer::{PreStopOutcome, SequencerState, SignalOutcome, TerminationSequencer};
pub use shutdown::Shutdown;
pub use signals::TerminationSignal;
