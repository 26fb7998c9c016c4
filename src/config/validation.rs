//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("http.port must not be 0")]
    ZeroHttpPort,

    #[error("registry.port must not be 0")]
    ZeroRegistryPort,

    #[error("registry.key must not be empty")]
    EmptyRegistryKey,

    #[error("circuit-breaker.max-failures must be at least 1")]
    ZeroMaxFailures,

    #[error("circuit-breaker.timeout must be greater than 0")]
    ZeroCallTimeout,

    #[error("circuit-breaker.reset-timeout must be greater than 0")]
    ZeroResetTimeout,

    #[error("timeouts.request-secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("observability.metrics-address is not a socket address: {0}")]
    BadMetricsAddress(String),
}

/// Validate a parsed configuration, collecting every violation.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http.port == 0 {
        errors.push(ValidationError::ZeroHttpPort);
    }
    if config.registry.port == 0 {
        errors.push(ValidationError::ZeroRegistryPort);
    }
    if config.registry.key.is_empty() {
        errors.push(ValidationError::EmptyRegistryKey);
    }
    if config.circuit_breaker.max_failures == 0 {
        errors.push(ValidationError::ZeroMaxFailures);
    }
    if config.circuit_breaker.timeout_ms == 0 {
        errors.push(ValidationError::ZeroCallTimeout);
    }
    if config.circuit_breaker.reset_timeout_ms == 0 {
        errors.push(ValidationError::ZeroResetTimeout);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::BadMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
