//! Listener lifecycle control.
//!
//! # Responsibilities
//! - Bind the listener and run its serve loop in the background
//! - Race the serve loop's own exit against the cancellation source
//! - On cancellation: drain once, then wait for the serve loop to finish
//! - Join drain and serve failures into one outcome
//!
//! # States
//! ```text
//! Starting --(bound)--> Serving --(cancelled)--> Draining --(serve exited)--> Stopped
//!                          └------(serve loop exits on its own)------------> Stopped
//! ```

use std::fmt;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{oneshot, watch};

use crate::config::ShutdownConfig;
use crate::lifecycle::error::{BindError, DrainError, ServeError};
use crate::lifecycle::shutdown::ShutdownOutcome;
use crate::lifecycle::signals::CancellationSource;
use crate::observability::metrics;

/// Produces a bound listener.
pub trait ListenerFactory: Send {
    type Listener: Listener;

    /// Bind the listening resource.
    fn bind(self) -> BoxFuture<'static, Result<Self::Listener, BindError>>;
}

/// A bound listener, ready to serve.
pub trait Listener: Send + 'static {
    /// Request handler the serve loop dispatches to.
    type Handler: Send + 'static;
    type Drain: Drain;

    /// Handle used to stop this listener gracefully.
    fn drain_handle(&self) -> Self::Drain;

    /// Run the accept/serve loop until the listener is closed or fails.
    fn serve(self, handler: Self::Handler) -> BoxFuture<'static, ServeError>;
}

/// Graceful stop for a running listener.
pub trait Drain: Send + 'static {
    /// Stop accepting new work and wait for in-flight work to finish.
    ///
    /// With a deadline, in-flight work still running when it expires is
    /// abandoned and `DrainError::DeadlineExceeded` is returned.
    fn drain(self, deadline: Option<Duration>) -> BoxFuture<'static, Result<(), DrainError>>;
}

/// Observable state of the service listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Serving,
    Draining,
    Stopped,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Serving => "serving",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs one listener lifecycle from bind to stop.
///
/// The controller is consumed by [`run`](Self::run); a new one is needed for
/// every lifecycle.
#[derive(Debug)]
pub struct ServiceLifecycleController {
    drain_deadline: Option<Duration>,
    state: watch::Sender<LifecycleState>,
}

impl ServiceLifecycleController {
    /// Create a controller whose drain uses the given deadline (`None` waits indefinitely).
    pub fn new(drain_deadline: Option<Duration>) -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            drain_deadline,
            state,
        }
    }

    pub fn from_config(config: &ShutdownConfig) -> Self {
        Self::new(config.drain_deadline())
    }

    /// Watch state transitions. Subscribe before calling `run`.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Bind, serve, and stop the listener.
    ///
    /// Returns `Err` only if binding fails. Otherwise the outcome records the
    /// drain result (if a drain was issued) and the serve loop's final error,
    /// with the expected `Closed` marker after a drain normalized away.
    pub async fn run<F, C>(
        self,
        factory: F,
        handler: <F::Listener as Listener>::Handler,
        cancellation: C,
    ) -> Result<ShutdownOutcome, BindError>
    where
        F: ListenerFactory,
        C: CancellationSource,
    {
        self.transition(LifecycleState::Starting);

        let listener = match factory.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                self.transition(LifecycleState::Stopped);
                return Err(e);
            }
        };
        let drain = listener.drain_handle();

        let (serve_tx, mut serve_rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = listener.serve(handler).await;
            let _ = serve_tx.send(result);
        });
        self.transition(LifecycleState::Serving);

        let cancelled = cancellation.cancelled();
        tokio::select! {
            biased;
            result = &mut serve_rx => {
                let error = result.unwrap_or(ServeError::Aborted);
                tracing::debug!(error = %error, "Serve loop exited before cancellation");
                self.transition(LifecycleState::Stopped);
                metrics::record_shutdown(false);
                return Ok(ShutdownOutcome::served(error));
            }
            () = cancelled => {}
        }

        self.transition(LifecycleState::Draining);
        let drained = drain.drain(self.drain_deadline).await;
        if let Err(e) = &drained {
            tracing::debug!(error = %e, "Drain did not complete cleanly");
        }

        let error = serve_rx.await.unwrap_or(ServeError::Aborted);
        let outcome = ShutdownOutcome::drained(drained, error);
        self.transition(LifecycleState::Stopped);
        metrics::record_shutdown(outcome.is_ok());

        Ok(outcome)
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!(from = %previous, to = %next, "Lifecycle transition");
        }
        metrics::record_lifecycle_state(next);
    }
}
