//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch unit of work:
//!     → circuit_breaker.rs (admit, enforce per-call deadline)
//!     → On failure: count toward the threshold, open the circuit
//!     → While open: fail fast, probe after the reset timeout
//! ```
//!
//! # Design Decisions
//! - One breaker guards the whole dispatch route, not one per backend;
//!   a failing instance among healthy ones sharing an api name trips it
//!   for all of them
//! - The breaker's deadline is the only cancellation mechanism for a
//!   dispatch; there is no separate retry layer

pub mod circuit_breaker;

pub use circuit_breaker::{BreakerError, BreakerState, CircuitBreaker};
