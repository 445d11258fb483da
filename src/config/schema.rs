//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a service
//! instance. All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which hop of the chain this instance plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Terminal hop: performs the work.
    #[default]
    Leaf,
    /// Intermediate hop: forwards each request to the downstream.
    Relay,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Leaf => "leaf",
            Role::Relay => "relay",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration for a service instance.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Role of this instance in the chain.
    pub role: Role,

    /// Identity reported in payloads and logs.
    pub identity: IdentityConfig,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Termination sequencing.
    pub drain: DrainConfig,

    /// Outbound call settings (relay only).
    pub downstream: DownstreamConfig,

    /// Synthetic work range (leaf only).
    pub work: WorkConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServiceConfig {
    /// Service name, derived from the role when not set explicitly.
    pub fn service_name(&self) -> String {
        self.identity
            .service
            .clone()
            .unwrap_or_else(|| format!("drain-chain-{}", self.role))
    }
}

/// Instance identity.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Explicit service name.
    pub service: Option<String>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Server-side bound on a single request, in seconds.
    pub request_timeout_secs: u64,
}

impl ListenerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            request_timeout_secs: 15,
        }
    }
}

/// Termination sequencing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DrainConfig {
    /// Time the routing layer needs to drop this instance, in milliseconds.
    pub convergence_delay_ms: u64,

    /// Upper bound on waiting for in-flight requests after the termination
    /// signal, in seconds.
    pub shutdown_grace_secs: u64,
}

impl DrainConfig {
    pub fn convergence_delay(&self) -> Duration {
        Duration::from_millis(self.convergence_delay_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            convergence_delay_ms: 5_000,
            shutdown_grace_secs: 30,
        }
    }
}

/// Downstream call configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Base URL of the downstream service.
    pub base_url: String,

    /// Path invoked on the downstream for each inbound request.
    pub path: String,

    /// Bound on TCP connection establishment, in milliseconds.
    pub connect_timeout_ms: u64,

    /// Bound on receiving the complete response, in milliseconds.
    pub response_timeout_ms: u64,

    /// Largest downstream body we are willing to buffer.
    pub max_response_bytes: usize,
}

impl DownstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://downstream-svc:5000".to_string(),
            path: "/process".to_string(),
            connect_timeout_ms: 2_000,
            response_timeout_ms: 10_000,
            max_response_bytes: 1024 * 1024,
        }
    }
}

/// Synthetic work configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkConfig {
    /// Lower bound of simulated work, in milliseconds.
    pub min_ms: u64,

    /// Upper bound of simulated work, in milliseconds (inclusive).
    pub max_ms: u64,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            min_ms: 150,
            max_ms: 700,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
