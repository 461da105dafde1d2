//! HTTP-reachable dependency (upstream APIs, search clusters).

use std::io;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time::timeout;

use crate::lifecycle::{BoxError, Dependency};

/// Dependency that is ready once a GET to its URL returns a 2xx status.
pub struct HttpDependency {
    name: String,
    url: String,
    connect_timeout: Duration,
    client: Client<HttpConnector, Body>,
}

impl HttpDependency {
    pub fn new(name: &str, url: &str, connect_timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            name: name.to_string(),
            url: url.to_string(),
            connect_timeout,
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn probe(&self) -> Result<(), BoxError> {
        let request = Request::builder()
            .method("GET")
            .uri(&self.url)
            .header("user-agent", "service-lifecycle-startup")
            .body(Body::empty())?;

        let response = timeout(self.connect_timeout, self.client.request(request))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("GET {} timed out after {:?}", self.url, self.connect_timeout),
                )
            })??;

        let status = response.status();
        if !status.is_success() {
            return Err(Box::new(UnhealthyStatus(status)));
        }

        tracing::info!(dependency = %self.name, url = %self.url, status = %status, "HTTP dependency ready");
        Ok(())
    }
}

impl std::fmt::Debug for HttpDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDependency")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl Dependency for HttpDependency {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&self) -> BoxFuture<'_, Result<(), BoxError>> {
        self.probe().boxed()
    }
}

/// The dependency answered, but not with a success status.
#[derive(Debug, thiserror::Error)]
#[error("dependency answered with status {0}")]
pub struct UnhealthyStatus(pub StatusCode);
