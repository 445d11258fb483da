//! Orchestrator-facing endpoints: health probe and pre-stop hook.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::health::HealthReport;
use crate::http::server::AppState;

/// `GET /health`: 200 "ok" while active, 503 "draining" afterwards.
pub async fn health_handler(State(state): State<AppState>) -> HealthReport {
    state.health.report()
}

/// `GET /prestop`: run the pre-termination path; returns once drain has begun.
pub async fn prestop_handler(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.sequencer.pre_stop().await;
    tracing::info!(
        service = %state.identity.service,
        hostname = %state.identity.hostname,
        outcome = ?outcome,
        inflight = state.inflight.count(),
        "Pre-stop hook returned"
    );
    (StatusCode::OK, "done")
}
