//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → prefix = first path segment, remainder = rest of the URI
//!     → circuit breaker admits the guarded unit:
//!         registry.list(http endpoints)
//!         → filter by metadata api name == prefix, pick any match
//!         → acquire connection handle, forward, relay
//!     → outcome fed back to the breaker
//!     → response written (404 no match, 502 on failure or open circuit)
//! ```
//!
//! # Design Decisions
//! - "Any matching instance" selection, no ordering or load distribution
//! - A missing backend is a caller error (404), never a breaker failure
//! - Upstream status >= 500 is what actually trips the breaker

pub mod dispatcher;

pub use dispatcher::Dispatcher;
