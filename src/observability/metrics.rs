//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_dispatch_total` (counter): dispatches by method, status, api
//! - `gateway_dispatch_duration_seconds` (histogram): latency distribution
//! - `gateway_breaker_state` (gauge): 0=closed, 1=open, 2=half-open

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::BreakerState;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!(
                "gateway_dispatch_total",
                "Dispatched requests by method, status and api prefix"
            );
            describe_histogram!(
                "gateway_dispatch_duration_seconds",
                "Dispatch latency distribution"
            );
            describe_gauge!(
                "gateway_breaker_state",
                "Circuit breaker state (0=closed, 1=open, 2=half-open)"
            );
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

/// Record one finished dispatch.
pub fn record_dispatch(method: &str, status: u16, api: &str, start: Instant) {
    counter!(
        "gateway_dispatch_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "api" => api.to_string(),
    )
    .increment(1);
    histogram!(
        "gateway_dispatch_duration_seconds",
        "method" => method.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

/// Publish the breaker state after a dispatch.
pub fn record_breaker_state(name: &str, state: BreakerState) {
    let value = match state {
        BreakerState::Closed => 0.0,
        BreakerState::Open => 1.0,
        BreakerState::HalfOpen => 2.0,
    };
    gauge!("gateway_breaker_state", "breaker" => name.to_string()).set(value);
}
