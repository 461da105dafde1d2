//! Coordinated service lifecycle.
//!
//! Connects backing dependencies before accepting traffic, then serves until
//! the listener fails or a termination signal arrives, draining in order and
//! reporting every failure that occurred along the way.

pub mod config;
pub mod dependencies;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod service;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use lifecycle::{ServiceLifecycleController, Shutdown, ShutdownOutcome};
pub use service::Service;
