//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses parse and paths are non-empty
//! - Validate value ranges (timeouts > 0, bounded debounce)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before settings are used to start anything

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// Longest accepted reload debounce.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a host:port address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must not be empty")]
    EmptyPath { field: &'static str },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("routes.debounce_ms must be at most {max}, got {0}", max = MAX_DEBOUNCE_MS)]
    DebounceTooLong(u64),

    #[error("observability.log_level: unknown level '{0}'")]
    UnknownLogLevel(String),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_listen_address(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.routes.path.trim().is_empty() {
        errors.push(ValidationError::EmptyPath { field: "routes.path" });
    }

    if config.routes.debounce_ms > MAX_DEBOUNCE_MS {
        errors.push(ValidationError::DebounceTooLong(config.routes.debounce_ms));
    }

    if config.geoip.enabled && config.geoip.database_path.trim().is_empty() {
        errors.push(ValidationError::EmptyPath { field: "geoip.database_path" });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `ip:port`, `[v6]:port` or `hostname:port`; host names resolve at bind time.
fn is_listen_address(value: &str) -> bool {
    if value.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match value.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !host.contains(char::is_whitespace) && !host.contains(':') && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}
