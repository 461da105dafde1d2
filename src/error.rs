//! Top-level service errors.

use thiserror::Error;

use crate::config::ConfigError;
use crate::lifecycle::{BindError, ShutdownError, StartupError};

/// Anything that ends the service with a failure.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("startup failed: {0}")]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("failed to shut down: {0}")]
    Shutdown(#[from] ShutdownError),

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}
