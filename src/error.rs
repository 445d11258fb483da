//! Error taxonomy for the request chain.
//!
//! # Design Decisions
//! - `ChainError` is what a caller one hop upstream can observe; each variant
//!   has exactly one HTTP status
//! - Admission rejection is local and terminal; it is never reported as a
//!   downstream fault
//! - `ServiceError` covers process-level failures (config, bind, serve)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::loader::ConfigError;
use crate::upstream::InvalidDownstream;

/// Body text returned when an instance refuses new work.
pub const DRAINING_MESSAGE: &str = "service is draining";

/// Failures surfaced to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// This instance is draining and refused new work.
    #[error("service is draining")]
    AdmissionRejected,

    /// Connection to the downstream could not be established.
    #[error("downstream unreachable: {detail}")]
    DownstreamUnreachable { detail: String },

    /// Connected, but the downstream did not answer within the response deadline.
    #[error("downstream stalled: {detail}")]
    DownstreamStalled { detail: String },

    /// The downstream answered with something we cannot pass through.
    #[error("downstream error: {detail}")]
    DownstreamProtocolError {
        detail: String,
        downstream_status: Option<u16>,
    },
}

impl ChainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChainError::AdmissionRejected => StatusCode::SERVICE_UNAVAILABLE,
            ChainError::DownstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            ChainError::DownstreamStalled { .. } => StatusCode::GATEWAY_TIMEOUT,
            ChainError::DownstreamProtocolError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code, used for metric labels and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            ChainError::AdmissionRejected => "service_draining",
            ChainError::DownstreamUnreachable { .. } => "downstream_unreachable",
            ChainError::DownstreamStalled { .. } => "downstream_stalled",
            ChainError::DownstreamProtocolError { .. } => "downstream_error",
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream_status: Option<u16>,
}

impl From<&ChainError> for ErrorBody {
    fn from(err: &ChainError) -> Self {
        match err {
            ChainError::AdmissionRejected => ErrorBody {
                error: DRAINING_MESSAGE.to_string(),
                detail: None,
                downstream_status: None,
            },
            ChainError::DownstreamUnreachable { detail }
            | ChainError::DownstreamStalled { detail } => ErrorBody {
                error: err.code().to_string(),
                detail: Some(detail.clone()),
                downstream_status: None,
            },
            ChainError::DownstreamProtocolError {
                detail,
                downstream_status,
            } => ErrorBody {
                error: err.code().to_string(),
                detail: Some(detail.clone()),
                downstream_status: *downstream_status,
            },
        }
    }
}

impl IntoResponse for ChainError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::from(&self))).into_response()
    }
}

/// Process-level failures that end the service with a non-zero exit.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Downstream(#[from] InvalidDownstream),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(ChainError::AdmissionRejected.status_code(), 503);
        let unreachable = ChainError::DownstreamUnreachable { detail: "refused".into() };
        assert_eq!(unreachable.status_code(), 502);
        let stalled = ChainError::DownstreamStalled { detail: "deadline".into() };
        assert_eq!(stalled.status_code(), 504);
        let protocol = ChainError::DownstreamProtocolError {
            detail: "bad json".into(),
            downstream_status: None,
        };
        assert_eq!(protocol.status_code(), 500);
    }

    #[test]
    fn draining_body_is_exact() {
        let body = serde_json::to_value(ErrorBody::from(&ChainError::AdmissionRejected)).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "service is draining" }));
    }

    #[test]
    fn downstream_status_is_carried() {
        let err = ChainError::DownstreamProtocolError {
            detail: "unexpected status".into(),
            downstream_status: Some(503),
        };
        let body = serde_json::to_value(ErrorBody::from(&err)).unwrap();
        assert_eq!(body["error"], "downstream_error");
        assert_eq!(body["downstream_status"], 503);
    }
}
