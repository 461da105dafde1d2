//! Cancellation sources.
//!
//! # Responsibilities
//! - Define what the lifecycle controller waits on to begin a drain
//! - Translate process termination signals into a cancellation event
//!
//! # Design Decisions
//! - Signal handlers are registered by constructing a [`TerminateSignal`]
//!   value, never as process-wide side effects of starting the service
//! - A source fires at most once; a source whose sender is gone never fires

use std::future;
use std::io;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::{broadcast, oneshot};

/// Something the lifecycle controller can wait on to start a graceful stop.
pub trait CancellationSource: Send + 'static {
    /// Resolves once, when cancellation is requested.
    fn cancelled(self) -> BoxFuture<'static, ()>;
}

impl CancellationSource for broadcast::Receiver<()> {
    fn cancelled(mut self) -> BoxFuture<'static, ()> {
        async move {
            match self.recv().await {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => future::pending().await,
            }
        }
        .boxed()
    }
}

impl CancellationSource for oneshot::Receiver<()> {
    fn cancelled(self) -> BoxFuture<'static, ()> {
        async move {
            if self.await.is_err() {
                future::pending::<()>().await;
            }
        }
        .boxed()
    }
}

/// Process termination request (SIGTERM or SIGINT on Unix, Ctrl+C elsewhere).
#[derive(Debug)]
pub struct TerminateSignal {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
}

impl TerminateSignal {
    /// Register the signal handlers. Must be called inside a Tokio runtime.
    pub fn install() -> io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let terminate = signal(SignalKind::terminate())?;
            let interrupt = signal(SignalKind::interrupt())?;
            tracing::debug!("Termination signal handlers installed");
            Ok(Self {
                terminate,
                interrupt,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }
}

impl CancellationSource for TerminateSignal {
    #[cfg(unix)]
    fn cancelled(mut self) -> BoxFuture<'static, ()> {
        async move {
            tokio::select! {
                _ = self.terminate.recv() => tracing::info!(signal = "SIGTERM", "Shutdown signal received"),
                _ = self.interrupt.recv() => tracing::info!(signal = "SIGINT", "Shutdown signal received"),
            }
        }
        .boxed()
    }

    #[cfg(not(unix))]
    fn cancelled(self) -> BoxFuture<'static, ()> {
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!(signal = "ctrl_c", "Shutdown signal received"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                    future::pending::<()>().await;
                }
            }
        }
        .boxed()
    }
}
