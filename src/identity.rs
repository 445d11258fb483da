//! Instance identity reported in payloads and log lines.

use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub service: String,
    pub hostname: String,
}

impl Identity {
    pub fn new(service: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            hostname: hostname.into(),
        }
    }

    /// Service name from config, hostname from `HOSTNAME` (pod name under an
    /// orchestrator), or "unknown".
    pub fn from_config(config: &ServiceConfig) -> Self {
        let hostname = std::env::var("HOSTNAME")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        Self::new(config.service_name(), hostname)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.service, self.hostname)
    }
}
