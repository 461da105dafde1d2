//! TCP-reachable dependency (database, cache, message broker).

use std::io;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::net::TcpStream;
use tokio::sync::OnceCell;
use tokio::time::timeout;

use crate::lifecycle::{BoxError, Dependency};

/// Dependency that is ready once a TCP connection to it succeeds.
///
/// The established stream is held for the life of the process.
#[derive(Debug)]
pub struct TcpDependency {
    name: String,
    address: String,
    connect_timeout: Duration,
    connection: OnceCell<TcpStream>,
}

impl TcpDependency {
    pub fn new(name: &str, address: &str, connect_timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            connect_timeout,
            connection: OnceCell::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    async fn establish(&self) -> Result<(), BoxError> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!(
                        "connect to {} timed out after {:?}",
                        self.address, self.connect_timeout
                    ),
                )
            })??;

        let peer = stream.peer_addr()?;
        if self.connection.set(stream).is_err() {
            tracing::warn!(dependency = %self.name, "Dependency was already connected");
        }

        tracing::info!(dependency = %self.name, peer = %peer, "TCP dependency connected");
        Ok(())
    }
}

impl Dependency for TcpDependency {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&self) -> BoxFuture<'_, Result<(), BoxError>> {
        self.establish().boxed()
    }
}
