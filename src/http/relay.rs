//! Relay role: forwards each request to the downstream hop.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::server::RelayState;
use crate::http::X_REQUEST_ID;
use crate::identity::Identity;

/// This hop's part of a combined response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopInfo {
    #[serde(flatten)]
    pub identity: Identity,
    pub elapsed_ms: u64,
}

/// Successful relay response: own identity plus the downstream payload as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse {
    pub upstream: HopInfo,
    pub downstream: Value,
}

/// `GET /` and `GET /call`.
pub async fn call_handler(State(state): State<RelayState>, headers: HeaderMap) -> Response {
    let _inflight = match state.app.admit() {
        Ok(guard) => guard,
        Err(rejected) => return rejected.into_response(),
    };

    let request_id = headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok());
    let report = state.caller.call(request_id).await;
    let kind = report.outcome.kind();
    let elapsed_ms = report.elapsed.as_millis() as u64;

    match report.outcome.into_result() {
        Ok(downstream) => (
            StatusCode::OK,
            Json(CallResponse {
                upstream: HopInfo {
                    identity: state.app.identity.as_ref().clone(),
                    elapsed_ms,
                },
                downstream,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(
                service = %state.app.identity.service,
                hostname = %state.app.identity.hostname,
                request_id = request_id.unwrap_or("unknown"),
                endpoint = %state.caller.endpoint(),
                kind,
                elapsed_ms,
                error = %err,
                "Downstream call failed"
            );
            err.into_response()
        }
    }
}
