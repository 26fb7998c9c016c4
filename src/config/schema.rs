//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! Keys are kebab-case on disk (`circuit-breaker.max-failures`).

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct GatewayConfig {
    /// Inbound HTTP listener settings.
    pub http: HttpConfig,

    /// Identity this gateway publishes into the registry.
    pub service: ServiceConfig,

    /// Shared service registry backend.
    pub registry: RegistryConfig,

    /// Circuit breaker guarding the dispatch route.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Inbound HTTP listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Bind address (host only; the port is separate so the published
    /// record can carry both).
    pub address: String,

    /// Bind port.
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: 8771,
        }
    }
}

/// Identity published into the registry for this gateway instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServiceConfig {
    /// Logical service name on the published record.
    pub name: String,

    /// Prefix key other gateways would route to this service by.
    pub api_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "service-gateway".to_string(),
            api_name: "service-gateway".to_string(),
        }
    }
}

/// Shared registry backend (an external key-value store).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegistryConfig {
    /// Backend host.
    pub host: String,

    /// Backend port.
    pub port: u16,

    /// Namespace key all records live under.
    pub key: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8761,
            key: "records".to_string(),
        }
    }
}

/// Circuit breaker configuration.
///
/// One breaker guards the whole dispatch route, not one per backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CircuitBreakerConfig {
    /// Breaker name, used in logs and metrics.
    pub name: String,

    /// Consecutive failures before the circuit opens.
    pub max_failures: u32,

    /// Per-call deadline in milliseconds; exceeding it counts as a failure.
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,

    /// Cooldown in milliseconds before an open circuit admits a probe.
    #[serde(rename = "reset-timeout")]
    pub reset_timeout_ms: u64,

    /// Return the fallback response instead of an error on failure.
    pub fallback_on_failure: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: "circuit-breaker".to_string(),
            max_failures: 5,
            timeout_ms: 500,
            reset_timeout_ms: 2000,
            fallback_on_failure: true,
        }
    }
}

/// Timeout configuration for the inbound surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TimeoutConfig {
    /// Total time allowed for one inbound request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
