//! OS signal handling.
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are installed up front so a registration failure is a startup
//!   error, not a silent lost signal
//! - SIGTERM and SIGINT both mean "terminate"; the listener only reports
//!   which one arrived, the lifecycle decides what that implies

use tokio::signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// SIGTERM, sent by the orchestrator after the pre-stop hook returns.
    Terminate,
    /// SIGINT / Ctrl+C.
    Interrupt,
}

impl std::fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationSignal::Terminate => f.write_str("SIGTERM"),
            TerminationSignal::Interrupt => f.write_str("SIGINT"),
        }
    }
}

/// Installed termination signal handlers.
pub struct TerminationListener {
    #[cfg(unix)]
    terminate: signal::unix::Signal,
}

impl TerminationListener {
    /// Register handlers. Must be called from within a Tokio runtime.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: signal::unix::signal(signal::unix::SignalKind::terminate())?,
        })
    }

    /// Wait for the first termination signal.
    #[cfg(unix)]
    pub async fn recv(mut self) -> TerminationSignal {
        tokio::select! {
            _ = self.terminate.recv() => TerminationSignal::Terminate,
            Ok(()) = signal::ctrl_c() => TerminationSignal::Interrupt,
        }
    }

    /// Wait for the first termination signal.
    #[cfg(not(unix))]
    pub async fn recv(self) -> TerminationSignal {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        TerminationSignal::Interrupt
    }
}
