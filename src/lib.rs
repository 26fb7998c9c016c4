//! Registry-backed dynamic API gateway.
//!
//! Forwards inbound HTTP requests to dynamically-registered backend
//! services, selected by a path-prefix-to-service mapping held in a shared
//! service registry, with a circuit breaker isolating callers from backend
//! failures.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod resilience;

pub use config::GatewayConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::{Registrar, Shutdown};
pub use registry::{RegistryClient, ServiceRecord};
pub use resilience::CircuitBreaker;
