//! Classification of one outbound call.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::ChainError;

/// Per-call deadlines. Lives only for the duration of one outbound request.
#[derive(Debug, Clone, Copy)]
pub struct CallAttempt {
    pub connect_deadline: Duration,
    pub response_deadline: Duration,
    pub started_at: Instant,
}

impl CallAttempt {
    pub fn start(connect_deadline: Duration, response_deadline: Duration) -> Self {
        Self {
            connect_deadline,
            response_deadline,
            started_at: Instant::now(),
        }
    }

    /// Worst-case wall-clock time this attempt may take.
    pub fn bound(&self) -> Duration {
        self.connect_deadline + self.response_deadline
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// How an outbound call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// 2xx with a JSON body.
    Success(Value),
    /// No connection could be made: actively refused, unresolvable, or the
    /// connect deadline passed. The downstream is gone; nothing was sent.
    ConnectionRefused(String),
    /// Connected, but the full response did not arrive before the response
    /// deadline. The downstream may still be working on the request.
    ResponseTimeout(String),
    /// Transport or protocol failure after connecting, a non-2xx status, or
    /// a body that is not JSON.
    OtherFailure {
        detail: String,
        downstream_status: Option<u16>,
    },
}

impl CallOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            CallOutcome::Success(_) => "success",
            CallOutcome::ConnectionRefused(_) => "connection_refused",
            CallOutcome::ResponseTimeout(_) => "response_timeout",
            CallOutcome::OtherFailure { .. } => "other_failure",
        }
    }

    /// Map onto what the caller reports to its own client.
    pub fn into_result(self) -> Result<Value, ChainError> {
        match self {
            CallOutcome::Success(payload) => Ok(payload),
            CallOutcome::ConnectionRefused(detail) => {
                Err(ChainError::DownstreamUnreachable { detail })
            }
            CallOutcome::ResponseTimeout(detail) => Err(ChainError::DownstreamStalled { detail }),
            CallOutcome::OtherFailure {
                detail,
                downstream_status,
            } => Err(ChainError::DownstreamProtocolError {
                detail,
                downstream_status,
            }),
        }
    }
}

/// Outcome plus timing of a finished call.
#[derive(Debug, Clone)]
pub struct CallReport {
    pub outcome: CallOutcome,
    pub elapsed: Duration,
}
