//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Backend process startup:
//!     record.rs (describe the endpoint)
//!         → client.rs publish() → store.rs (backing key-value store)
//!
//! Dispatch:
//!     client.rs list(predicate) → store.rs
//!         → client.rs get_connection() → pooled HTTP client handle
//!         → handle released on drop
//! ```
//!
//! # Design Decisions
//! - The backing store is an opaque external collaborator behind the
//!   `RecordStore` trait; publish/unpublish/list are its whole surface
//! - Connection handles are scoped: acquisition returns an RAII guard so
//!   release happens on every exit path
//! - Records carry no heartbeat or TTL: a record published by a process
//!   that crashed without unpublishing persists until removed by hand,
//!   and keeps being selected (the circuit breaker is the only mitigation)

pub mod client;
pub mod record;
pub mod store;

use thiserror::Error;

pub use client::{ConnectionHandle, RegistryClient};
pub use record::{RecordMetadata, ServiceRecord, HTTP_ENDPOINT};
pub use store::{MemoryStore, RecordStore, RedisStore};

/// Errors surfaced by the registry client and its backing store.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The backing store cannot be reached.
    #[error("registry backend unavailable: {0}")]
    Unavailable(String),

    /// No record is registered under the given registration id.
    #[error("no record registered under id [{0}]")]
    NotFound(String),

    /// A stored record could not be encoded or decoded.
    #[error("stored record is not readable: {0}")]
    Corrupt(String),
}
