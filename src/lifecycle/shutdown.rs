//! Shutdown triggering and outcome aggregation.

use std::fmt;

use tokio::sync::broadcast;

use crate::lifecycle::error::{DrainError, ServeError};

/// In-process shutdown trigger.
///
/// Subscribers are cancellation sources for the lifecycle controller; calling
/// [`Shutdown::trigger`] fires every one of them once.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the shutdown signal. Returns the number of subscribers notified.
    pub fn trigger(&self) -> usize {
        tracing::info!(subscribers = self.tx.receiver_count(), "Shutdown triggered");
        self.tx.send(()).unwrap_or(0)
    }

    /// Number of subscribers still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to the drain request during a lifecycle.
#[derive(Debug, Default)]
pub enum DrainStatus {
    /// The serve loop ended before any cancellation; no drain was issued.
    #[default]
    NotAttempted,
    /// Drain was issued and completed.
    Completed,
    /// Drain was issued and failed.
    Failed(DrainError),
}

/// Result of one listener lifecycle.
///
/// Both components are kept: a drain failure never hides the serve loop's
/// final error and vice versa.
#[derive(Debug, Default)]
pub struct ShutdownOutcome {
    pub drain: DrainStatus,
    pub serve: Option<ServeError>,
}

impl ShutdownOutcome {
    /// Outcome when the serve loop exits before cancellation.
    ///
    /// A listener closed from elsewhere is a clean stop, not a failure.
    pub fn served(error: ServeError) -> Self {
        Self {
            drain: DrainStatus::NotAttempted,
            serve: (!error.is_closed()).then_some(error),
        }
    }

    /// Outcome after a drain. An expected `Closed` from the serve loop is not an error.
    pub fn drained(drain: Result<(), DrainError>, serve: ServeError) -> Self {
        Self {
            drain: match drain {
                Ok(()) => DrainStatus::Completed,
                Err(e) => DrainStatus::Failed(e),
            },
            serve: (!serve.is_closed()).then_some(serve),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.drain_error().is_none() && self.serve.is_none()
    }

    pub fn drain_attempted(&self) -> bool {
        !matches!(self.drain, DrainStatus::NotAttempted)
    }

    pub fn drain_error(&self) -> Option<&DrainError> {
        match &self.drain {
            DrainStatus::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn serve_error(&self) -> Option<&ServeError> {
        self.serve.as_ref()
    }

    /// Collapse into a joined error, `Ok` if neither component failed.
    pub fn into_result(self) -> Result<(), ShutdownError> {
        let drain = match self.drain {
            DrainStatus::Failed(e) => Some(e),
            _ => None,
        };
        if drain.is_none() && self.serve.is_none() {
            return Ok(());
        }
        Err(ShutdownError {
            drain,
            serve: self.serve,
        })
    }
}

/// Joined lifecycle failure carrying every cause that occurred.
#[derive(Debug)]
pub struct ShutdownError {
    drain: Option<DrainError>,
    serve: Option<ServeError>,
}

impl ShutdownError {
    pub fn drain(&self) -> Option<&DrainError> {
        self.drain.as_ref()
    }

    pub fn serve(&self) -> Option<&ServeError> {
        self.serve.as_ref()
    }

    /// Every cause, drain first.
    pub fn causes(&self) -> impl Iterator<Item = &(dyn std::error::Error + 'static)> {
        let drain = self.drain.as_ref().map(|e| e as &(dyn std::error::Error + 'static));
        let serve = self.serve.as_ref().map(|e| e as &(dyn std::error::Error + 'static));
        drain.into_iter().chain(serve)
    }
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cause) in self.causes().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShutdownError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.causes().next()
    }
}
