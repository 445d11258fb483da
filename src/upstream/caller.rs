//! Deadline-bounded calls to the downstream hop.
//!
//! # Responsibilities
//! - Connect within the connect deadline
//! - Send the request and read the whole response within the response deadline
//! - Classify the result so refused and stalled downstreams stay distinct
//! - Release the connection on every exit path, including deadline expiry
//!
//! # Design Decisions
//! - Two phases with separate `tokio::time::timeout`s instead of one overall
//!   timeout, so a stall is never reported as a refusal
//! - One connection per call: the connection task is aborted when the call
//!   ends, so a half-dead downstream cannot leave sockets behind
//! - No retries

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time;
use url::Url;

use crate::config::DownstreamConfig;
use crate::http::X_REQUEST_ID;
use crate::observability::metrics;
use crate::upstream::outcome::{CallAttempt, CallOutcome, CallReport};

/// The downstream base URL cannot be used for outbound calls.
#[derive(Debug, thiserror::Error)]
#[error("invalid downstream url {url:?}: {reason}")]
pub struct InvalidDownstream {
    pub url: String,
    pub reason: String,
}

/// Failures after the connection is up.
#[derive(Debug, thiserror::Error)]
enum ExchangeError {
    #[error("building request: {0}")]
    Request(#[from] axum::http::Error),
    #[error("{0}")]
    Hyper(#[from] hyper::Error),
    #[error("reading body: {0}")]
    Body(#[from] axum::Error),
}

/// Aborts the connection driver when the call is finished or cancelled.
struct ConnectionTask(JoinHandle<()>);

impl Drop for ConnectionTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Outbound client for one downstream service.
#[derive(Debug, Clone)]
pub struct UpstreamCaller {
    /// `host:port` used to open the TCP connection.
    authority: String,
    /// Value of the `Host` header.
    host_header: HeaderValue,
    /// Path and query requested on the downstream.
    target: String,
    connect_deadline: Duration,
    response_deadline: Duration,
    max_response_bytes: usize,
}

impl UpstreamCaller {
    pub fn new(config: &DownstreamConfig) -> Result<Self, InvalidDownstream> {
        let invalid = |reason: &str| InvalidDownstream {
            url: config.base_url.clone(),
            reason: reason.to_string(),
        };

        let base = Url::parse(&config.base_url).map_err(|e| invalid(&e.to_string()))?;
        if base.scheme() != "http" {
            return Err(invalid("only http:// is supported"));
        }
        let host = base.host_str().ok_or_else(|| invalid("missing host"))?;
        let port = base
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port"))?;

        let host_header = match base.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let host_header =
            HeaderValue::from_str(&host_header).map_err(|e| invalid(&e.to_string()))?;

        let target = format!("{}{}", base.path().trim_end_matches('/'), config.path);

        Ok(Self {
            authority: format!("{host}:{port}"),
            host_header,
            target,
            connect_deadline: config.connect_timeout(),
            response_deadline: config.response_timeout(),
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// Human-readable target, for logs.
    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.authority, self.target)
    }

    /// Issue one GET to the downstream. Never takes longer than
    /// `connect_deadline + response_deadline` (plus scheduling slack).
    pub async fn call(&self, request_id: Option<&str>) -> CallReport {
        let attempt = CallAttempt::start(self.connect_deadline, self.response_deadline);
        let outcome = self.attempt(request_id).await;
        let elapsed = attempt.elapsed();

        metrics::record_downstream_call(outcome.kind(), elapsed);
        tracing::debug!(
            endpoint = %self.endpoint(),
            outcome = outcome.kind(),
            elapsed_ms = elapsed.as_millis() as u64,
            bound_ms = attempt.bound().as_millis() as u64,
            "Downstream call finished"
        );

        CallReport { outcome, elapsed }
    }

    async fn attempt(&self, request_id: Option<&str>) -> CallOutcome {
        // Phase 1: TCP connect (including name resolution).
        let connect = TcpStream::connect(&self.authority);
        let stream = match time::timeout(self.connect_deadline, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return CallOutcome::ConnectionRefused(format!(
                    "connect to {} failed: {}",
                    self.authority, e
                ))
            }
            Err(_) => {
                return CallOutcome::ConnectionRefused(format!(
                    "connect to {} timed out after {}ms",
                    self.authority,
                    self.connect_deadline.as_millis()
                ))
            }
        };

        // Phase 2: request and complete response. Dropping the exchange on
        // timeout drops the connection task guard, which closes the socket.
        match time::timeout(self.response_deadline, self.exchange(stream, request_id)).await {
            Err(_) => CallOutcome::ResponseTimeout(format!(
                "no complete response from {} within {}ms",
                self.authority,
                self.response_deadline.as_millis()
            )),
            Ok(Err(e)) => CallOutcome::OtherFailure {
                detail: e.to_string(),
                downstream_status: None,
            },
            Ok(Ok((status, body))) => classify_response(status, &body),
        }
    }

    async fn exchange(
        &self,
        stream: TcpStream,
        request_id: Option<&str>,
    ) -> Result<(StatusCode, axum::body::Bytes), ExchangeError> {
        let (mut sender, connection) = http1::handshake::<_, Body>(TokioIo::new(stream)).await?;
        let _connection = ConnectionTask(tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(error = %e, "Downstream connection closed with error");
            }
        }));

        let mut request = Request::builder()
            .method(Method::GET)
            .uri(self.target.as_str())
            .header(header::HOST, self.host_header.clone())
            .header(header::USER_AGENT, concat!("drain-chain/", env!("CARGO_PKG_VERSION")))
            .header(header::ACCEPT, "application/json");
        if let Some(id) = request_id {
            request = request.header(X_REQUEST_ID, id);
        }
        let request = request.body(Body::empty())?;

        let response = sender.send_request(request).await?;
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(Body::new(body), self.max_response_bytes).await?;

        Ok((parts.status, bytes))
    }
}

fn classify_response(status: StatusCode, body: &[u8]) -> CallOutcome {
    if !status.is_success() {
        return CallOutcome::OtherFailure {
            detail: format!("downstream returned {status}"),
            downstream_status: Some(status.as_u16()),
        };
    }
    match serde_json::from_slice(body) {
        Ok(payload) => CallOutcome::Success(payload),
        Err(e) => CallOutcome::OtherFailure {
            detail: format!("bad downstream json: {e}"),
            downstream_status: Some(status.as_u16()),
        },
    }
}
