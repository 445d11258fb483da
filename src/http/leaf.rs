//! Leaf role: performs the work.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ChainError;
use crate::http::server::AppState;

/// Payload of a completed unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub service: String,
    pub hostname: String,
    pub work_ms: u64,
    pub processed_at: String,
}

/// `GET /process`: reject if draining, otherwise run synthetic work.
pub async fn process_handler(
    State(state): State<AppState>,
) -> Result<Json<ProcessResponse>, ChainError> {
    let _inflight = state.admit()?;

    let report = state.work.perform().await;

    Ok(Json(ProcessResponse {
        service: state.identity.service.clone(),
        hostname: state.identity.hostname.clone(),
        work_ms: report.work_ms,
        processed_at: report.processed_at,
    }))
}
