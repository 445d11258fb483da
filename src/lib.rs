//! Drain-coordinated request chain services.
//!
//! One binary, two roles. A **leaf** instance performs units of work on
//! `GET /process`; a **relay** instance forwards `GET /call` to a downstream
//! leaf with explicit connect and response deadlines. Both roles share the
//! same termination machinery: a pre-stop hook that waits for routing
//! convergence before draining, a health probe that reports the drain state,
//! and a signal path that guarantees drain before the process exits.

// Core
pub mod config;
pub mod drain;
pub mod error;
pub mod identity;

// Roles
pub mod http;
pub mod upstream;
pub mod work;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use drain::{DrainCoordinator, DrainState};
pub use error::{ChainError, ServiceError};
pub use http::HttpServer;
pub use lifecycle::{Shutdown, TerminationSequencer};
