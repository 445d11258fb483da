//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, tracing)
//!     → probes.rs (/health, /prestop)       both roles
//!     → leaf.rs   (/process)                leaf role
//!     → relay.rs  (/, /call → downstream)   relay role
//! ```

pub mod leaf;
pub mod probes;
pub mod relay;
pub mod server;

pub use server::{AppState, HttpServer};

/// Header carrying the correlation id across hops.
pub const X_REQUEST_ID: &str = "x-request-id";
