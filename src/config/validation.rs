//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, work range ordered)
//! - Relay instances need a usable downstream address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{Role, ServiceConfig};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }
    if config.work.min_ms > config.work.max_ms {
        errors.push(ValidationError::new(
            "work",
            format!("min_ms ({}) exceeds max_ms ({})", config.work.min_ms, config.work.max_ms),
        ));
    }

    if config.role == Role::Relay {
        let downstream = &config.downstream;
        match Url::parse(&downstream.base_url) {
            Ok(url) if matches!(url.scheme(), "http") && url.host().is_some() => {}
            Ok(url) => errors.push(ValidationError::new(
                "downstream.base_url",
                format!("unsupported url {url}; expected http://host[:port]"),
            )),
            Err(e) => errors.push(ValidationError::new("downstream.base_url", e.to_string())),
        }
        if !downstream.path.starts_with('/') {
            errors.push(ValidationError::new("downstream.path", "must start with '/'"));
        }
        if downstream.connect_timeout_ms == 0 {
            errors.push(ValidationError::new("downstream.connect_timeout_ms", "must be > 0"));
        }
        if downstream.response_timeout_ms == 0 {
            errors.push(ValidationError::new("downstream.response_timeout_ms", "must be > 0"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
