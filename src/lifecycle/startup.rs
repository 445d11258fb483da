//! Startup and run-to-exit orchestration.
//!
//! # Responsibilities
//! - Bind the listener
//! - Start the HTTP server
//! - On the termination signal: guarantee drain, stop accepting, wait
//!   (bounded) for in-flight requests, return
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A signal-driven shutdown always returns `Ok`, even when the grace
//!   period expires with requests still running

use std::future::Future;

use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::http::HttpServer;
use crate::lifecycle::signals::TerminationSignal;
use crate::lifecycle::Shutdown;

/// Bind the configured listener address.
pub async fn bind(config: &ServiceConfig) -> Result<TcpListener, ServiceError> {
    let address = &config.listener.bind_address;
    TcpListener::bind(address)
        .await
        .map_err(|source| ServiceError::Bind {
            address: address.clone(),
            source,
        })
}

/// Serve on `listener` until `termination` resolves, then shut down cleanly.
pub async fn run<F>(
    config: ServiceConfig,
    listener: TcpListener,
    termination: F,
) -> Result<(), ServiceError>
where
    F: Future<Output = TerminationSignal>,
{
    let grace = config.drain.shutdown_grace();
    let server = HttpServer::new(config)?;
    let state = server.state().clone();

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.clone()));

    let signal = tokio::select! {
        signal = termination => signal,
        result = &mut server_task => {
            // The server only stops on its own when it failed.
            result??;
            return Ok(());
        }
    };

    tracing::info!(
        %signal,
        service = %state.identity.service,
        hostname = %state.identity.hostname,
        inflight = state.inflight.count(),
        "Termination signal received, beginning graceful shutdown"
    );

    let outcome = state.sequencer.on_termination_signal().await;
    tracing::info!(outcome = ?outcome, "Drain confirmed before exit");

    shutdown.trigger();
    match tokio::time::timeout(grace, &mut server_task).await {
        Ok(result) => {
            result??;
            tracing::info!("All handlers returned, server closed cleanly");
        }
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                inflight = state.inflight.count(),
                "Shutdown grace expired, forcing exit"
            );
            server_task.abort();
        }
    }

    Ok(())
}
