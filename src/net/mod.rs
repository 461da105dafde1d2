//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! HttpListenerFactory::bind (fixed endpoint or pre-bound socket)
//!     → HttpListener::serve (axum accept loop, graceful shutdown)
//!     → HttpDrain::drain (stop accepting, wait, force at deadline)
//!
//! States (driven by lifecycle::controller):
//!     Starting → Serving → Draining → Stopped
//! ```
//!
//! # Design Decisions
//! - The listener is owned by the lifecycle controller; nothing else touches it
//! - Drain deadline is an argument of the drain call

pub mod listener;

pub use listener::{HttpDrain, HttpListener, HttpListenerFactory};
