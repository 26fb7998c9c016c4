//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → construct registry/breaker/dispatcher → bind listener
//!     → registrar publishes this gateway's own endpoint
//!
//! Shutdown:
//!     Signal received → stop accepting → drain connections
//!     → registrar unpublishes all self-registered records (concurrently)
//!     → registry connection released last
//! ```
//!
//! # Design Decisions
//! - The registrar only tracks records *this* process published
//! - Unregistrations run concurrently; one stuck unpublish does not delay
//!   the others; failures aggregate into a single shutdown error

pub mod registrar;
pub mod shutdown;

pub use registrar::{Registrar, ShutdownError};
pub use shutdown::Shutdown;
