//! HTTP listener driven by the lifecycle controller.
//!
//! # Responsibilities
//! - Bind to the service endpoint
//! - Run the axum serve loop with graceful shutdown
//! - Expose a drain handle that stops accepting, waits for in-flight
//!   requests, and forces the loop to stop once the deadline expires

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::net::TcpListener;
use tokio::sync::{watch, Notify};

use crate::lifecycle::{BindError, Drain, DrainError, Listener, ListenerFactory, ServeError};

/// Binds the HTTP listener.
#[derive(Debug)]
pub struct HttpListenerFactory {
    source: Source,
}

#[derive(Debug)]
enum Source {
    Address(String),
    Bound(TcpListener),
}

impl HttpListenerFactory {
    /// Bind `address` when the controller starts.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            source: Source::Address(address.into()),
        }
    }

    /// Serve on a listener that is already bound.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self {
            source: Source::Bound(listener),
        }
    }
}

impl ListenerFactory for HttpListenerFactory {
    type Listener = HttpListener;

    fn bind(self) -> BoxFuture<'static, Result<HttpListener, BindError>> {
        async move {
            let inner = match self.source {
                Source::Bound(listener) => listener,
                Source::Address(address) => TcpListener::bind(&address)
                    .await
                    .map_err(|e| BindError::new(address.clone(), e))?,
            };

            let local_addr = inner
                .local_addr()
                .map_err(|e| BindError::new("<bound listener>", e))?;
            tracing::info!(address = %local_addr, "Listener bound");

            Ok(HttpListener::new(inner, local_addr))
        }
        .boxed()
    }
}

/// A bound HTTP listener.
#[derive(Debug)]
pub struct HttpListener {
    inner: TcpListener,
    local_addr: SocketAddr,
    signals: Arc<DrainSignals>,
    finished_tx: watch::Sender<bool>,
}

#[derive(Debug, Default)]
struct DrainSignals {
    /// Stop accepting and let in-flight requests finish.
    graceful: Notify,
    /// Stop now, abandoning in-flight requests.
    force: Notify,
}

impl HttpListener {
    fn new(inner: TcpListener, local_addr: SocketAddr) -> Self {
        let (finished_tx, _) = watch::channel(false);
        Self {
            inner,
            local_addr,
            signals: Arc::new(DrainSignals::default()),
            finished_tx,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Listener for HttpListener {
    type Handler = Router;
    type Drain = HttpDrain;

    fn drain_handle(&self) -> HttpDrain {
        HttpDrain {
            local_addr: self.local_addr,
            signals: Arc::clone(&self.signals),
            finished: self.finished_tx.subscribe(),
        }
    }

    fn serve(self, handler: Router) -> BoxFuture<'static, ServeError> {
        let HttpListener {
            inner,
            local_addr,
            signals,
            finished_tx,
        } = self;

        async move {
            tracing::info!(address = %local_addr, "HTTP server starting");

            let app = handler.into_make_service_with_connect_info::<SocketAddr>();
            let graceful_signals = Arc::clone(&signals);
            let server = axum::serve(inner, app)
                .with_graceful_shutdown(async move { graceful_signals.graceful.notified().await })
                .into_future();

            let result = tokio::select! {
                result = server => result,
                () = signals.force.notified() => {
                    tracing::warn!(address = %local_addr, "HTTP server stopped with requests in flight");
                    Ok(())
                }
            };
            finished_tx.send_replace(true);

            match result {
                Ok(()) => {
                    tracing::info!(address = %local_addr, "HTTP server stopped");
                    ServeError::Closed
                }
                Err(e) => ServeError::Io(e),
            }
        }
        .boxed()
    }
}

/// Graceful stop handle for an [`HttpListener`].
#[derive(Debug)]
pub struct HttpDrain {
    local_addr: SocketAddr,
    signals: Arc<DrainSignals>,
    finished: watch::Receiver<bool>,
}

impl Drain for HttpDrain {
    fn drain(mut self, deadline: Option<Duration>) -> BoxFuture<'static, Result<(), DrainError>> {
        async move {
            tracing::info!(
                address = %self.local_addr,
                deadline = ?deadline,
                "Draining HTTP server"
            );
            self.signals.graceful.notify_one();

            // A dropped sender means the serve loop is already gone.
            let finished = self.finished.wait_for(|done| *done).map(|_| ());
            match deadline {
                None => {
                    finished.await;
                    Ok(())
                }
                Some(deadline) => match tokio::time::timeout(deadline, finished).await {
                    Ok(()) => Ok(()),
                    Err(_) => {
                        self.signals.force.notify_one();
                        Err(DrainError::DeadlineExceeded(deadline))
                    }
                },
            }
        }
        .boxed()
    }
}
