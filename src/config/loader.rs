//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{LogFormat, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Durations are given in (fractional) seconds.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("SERVICE_NAME") {
        config.identity.service = Some(v);
    }
    if let Some(v) = lookup("DOWNSTREAM_URL") {
        config.downstream.base_url = v;
    }
    if let Some(v) = lookup("CONNECT_TIMEOUT") {
        config.downstream.connect_timeout_ms = secs_to_ms("CONNECT_TIMEOUT", v)?;
    }
    // READ_TIMEOUT is the older name; RESPONSE_TIMEOUT wins when both are set.
    if let Some(v) = lookup("READ_TIMEOUT") {
        config.downstream.response_timeout_ms = secs_to_ms("READ_TIMEOUT", v)?;
    }
    if let Some(v) = lookup("RESPONSE_TIMEOUT") {
        config.downstream.response_timeout_ms = secs_to_ms("RESPONSE_TIMEOUT", v)?;
    }
    if let Some(v) = lookup("CONVERGENCE_DELAY") {
        config.drain.convergence_delay_ms = secs_to_ms("CONVERGENCE_DELAY", v)?;
    }
    if let Some(v) = lookup("SHUTDOWN_GRACE") {
        config.drain.shutdown_grace_secs = v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { var: "SHUTDOWN_GRACE", value: v })?;
    }
    if let Some(v) = lookup("LOG_FORMAT") {
        config.observability.log_format = match v.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            _ => return Err(ConfigError::Env { var: "LOG_FORMAT", value: v }),
        };
    }
    Ok(())
}

fn secs_to_ms(var: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok((secs * 1000.0).round() as u64),
        _ => Err(ConfigError::Env { var, value }),
    }
}
