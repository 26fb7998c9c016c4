//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, wildcard route)
//!     → request.rs (request ID, caller principal)
//!     → [dispatcher resolves a backend via the registry]
//!     → response.rs (structured error bodies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, UserPrincipal, X_REQUEST_ID};
pub use server::HttpServer;
