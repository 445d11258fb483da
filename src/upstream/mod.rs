//! Outbound calls from an intermediate hop.
//!
//! # Data Flow
//! ```text
//! Relay handler
//!     → caller.rs (connect deadline, then response deadline)
//!     → outcome.rs (Success | ConnectionRefused | ResponseTimeout | OtherFailure)
//!     → ChainError (502 | 504 | 500) or 200 pass-through
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; both deadlines are always set
//! - Refused and stalled stay distinct end-to-end: the first is safe to retry
//!   elsewhere, the second may still be executing downstream
//! - Retry policy belongs to callers, not here

pub mod caller;
pub mod outcome;

pub use caller::{InvalidDownstream, UpstreamCaller};
pub use outcome::{CallAttempt, CallOutcome, CallReport};
