//! Listener lifecycle errors.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// The listener could not be bound. Nothing was started, so nothing is drained.
#[derive(Debug, Error)]
#[error("failed to bind {address}: {source}")]
pub struct BindError {
    pub address: String,
    #[source]
    pub source: io::Error,
}

impl BindError {
    pub fn new(address: impl Into<String>, source: io::Error) -> Self {
        Self {
            address: address.into(),
            source,
        }
    }
}

/// Terminal result of a serve loop.
///
/// A serve loop always ends with one of these; `Closed` is the expected
/// marker after a successful drain.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listener was closed and stopped accepting connections.
    #[error("listener closed")]
    Closed,

    /// The accept/serve loop failed.
    #[error("serve loop failed: {0}")]
    Io(#[from] io::Error),

    /// The serve task ended without reporting (it panicked or was cancelled).
    #[error("serve task stopped without reporting a result")]
    Aborted,
}

impl ServeError {
    pub fn is_closed(&self) -> bool {
        matches!(self, ServeError::Closed)
    }
}

/// Graceful stop did not complete cleanly.
#[derive(Debug, Error)]
pub enum DrainError {
    /// In-flight work was still running when the drain deadline expired.
    #[error("drain deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("drain failed: {0}")]
    Failed(#[from] io::Error),
}
