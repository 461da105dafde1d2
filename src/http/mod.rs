//! HTTP request handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::listener)
//!     → request.rs (assign/propagate request ID)
//!     → tower-http layers (trace, timeout, body limit)
//!     → middleware.rs (in-flight limit, request metrics)
//!     → handler
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{build_router, with_layers};
