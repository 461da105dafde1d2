//! Dependency startup coordination.
//!
//! # Responsibilities
//! - Connect every backing dependency before the listener is bound
//! - Run connections concurrently (or sequentially, as a baseline)
//! - Report the first failure in declared order
//!
//! # Design Decisions
//! - Completions are consumed in declared order, not completion order, so the
//!   reported error is reproducible regardless of scheduling
//! - Each task reports through its own oneshot channel; no shared state
//! - Once a failure is reported, tasks for later dependencies are aborted
//!   best-effort; their results are never consulted

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::observability::metrics;

/// Boxed error returned by dependency connections.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A backing dependency that must be reachable before traffic is accepted.
pub trait Dependency: Send + Sync + 'static {
    /// Name used in logs, metrics and error reports.
    fn name(&self) -> &str;

    /// Establish the connection. Called at most once per process.
    fn connect(&self) -> BoxFuture<'_, Result<(), BoxError>>;
}

/// Dependency backed by an async closure.
pub struct FnDependency<F> {
    name: String,
    connect: F,
}

impl<F, Fut> FnDependency<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, connect: F) -> Self {
        Self {
            name: name.into(),
            connect,
        }
    }
}

impl<F, Fut> Dependency for FnDependency<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&self) -> BoxFuture<'_, Result<(), BoxError>> {
        (self.connect)().boxed()
    }
}

impl<F> fmt::Debug for FnDependency<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDependency").field("name", &self.name).finish()
    }
}

/// Error reported when a dependency fails to start.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The dependency's `connect` returned an error.
    #[error("dependency #{index} ({name}) failed to connect: {source}")]
    Connect {
        index: usize,
        name: String,
        #[source]
        source: BoxError,
    },

    /// The connection task ended without reporting (it panicked or was cancelled).
    #[error("dependency #{index} ({name}) stopped without reporting a result")]
    Aborted { index: usize, name: String },
}

impl StartupError {
    /// Declared position of the failing dependency.
    pub fn index(&self) -> usize {
        match self {
            StartupError::Connect { index, .. } | StartupError::Aborted { index, .. } => *index,
        }
    }

    /// Name of the failing dependency.
    pub fn name(&self) -> &str {
        match self {
            StartupError::Connect { name, .. } | StartupError::Aborted { name, .. } => name,
        }
    }
}

/// How dependencies are brought up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupStrategy {
    /// All dependencies connect at once; latency is that of the slowest.
    #[default]
    Concurrent,
    /// One after another; latency is the sum of all connections.
    Sequential,
}

impl StartupStrategy {
    /// Start the dependencies with this strategy.
    pub async fn start(self, dependencies: &[Arc<dyn Dependency>]) -> Result<(), StartupError> {
        let start = Instant::now();
        let result = match self {
            StartupStrategy::Concurrent => start_all(dependencies).await,
            StartupStrategy::Sequential => start_all_sequential(dependencies).await,
        };

        metrics::record_startup(self.as_str(), result.is_ok(), start);
        match &result {
            Ok(()) => tracing::info!(
                strategy = self.as_str(),
                dependencies = dependencies.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Dependencies started"
            ),
            Err(e) => tracing::debug!(
                strategy = self.as_str(),
                index = e.index(),
                dependency = e.name(),
                "Dependency startup failed"
            ),
        }
        result
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StartupStrategy::Concurrent => "concurrent",
            StartupStrategy::Sequential => "sequential",
        }
    }
}

impl fmt::Display for StartupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connect all dependencies concurrently.
///
/// Results are scanned in declared order: the error returned always belongs to
/// the lowest-indexed failing dependency, even if a later one failed first.
/// Returns `Ok(())` only after every dependency has connected.
pub async fn start_all(dependencies: &[Arc<dyn Dependency>]) -> Result<(), StartupError> {
    let mut pending = Vec::with_capacity(dependencies.len());

    for dependency in dependencies {
        let (tx, rx) = oneshot::channel();
        let dependency = Arc::clone(dependency);
        let handle = tokio::spawn(async move {
            let result = connect_one(dependency.as_ref()).await;
            let _ = tx.send(result);
        });
        pending.push((rx, handle.abort_handle()));
    }

    let mut pending = Stragglers(pending.into_iter().enumerate());
    while let Some((index, (rx, _))) = pending.0.next() {
        let dependency = &dependencies[index];
        match rx.await {
            Ok(Ok(())) => {}
            Ok(Err(source)) => {
                return Err(StartupError::Connect {
                    index,
                    name: dependency.name().to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(StartupError::Aborted {
                    index,
                    name: dependency.name().to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Connect dependencies one at a time, stopping at the first failure.
///
/// Dependencies after the failing one are never connected.
pub async fn start_all_sequential(dependencies: &[Arc<dyn Dependency>]) -> Result<(), StartupError> {
    for (index, dependency) in dependencies.iter().enumerate() {
        connect_one(dependency.as_ref())
            .await
            .map_err(|source| StartupError::Connect {
                index,
                name: dependency.name().to_string(),
                source,
            })?;
    }
    Ok(())
}

async fn connect_one(dependency: &dyn Dependency) -> Result<(), BoxError> {
    let start = Instant::now();
    let result = dependency.connect().await;
    metrics::record_dependency_connect(dependency.name(), result.is_ok(), start);

    match &result {
        Ok(()) => tracing::debug!(
            dependency = dependency.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dependency connected"
        ),
        Err(e) => tracing::debug!(
            dependency = dependency.name(),
            error = %e,
            "Dependency connection failed"
        ),
    }
    result
}

type Completion = (oneshot::Receiver<Result<(), BoxError>>, AbortHandle);

/// Connection tasks not yet scanned. Dropping it aborts whatever is left.
struct Stragglers(std::iter::Enumerate<std::vec::IntoIter<Completion>>);

impl Drop for Stragglers {
    fn drop(&mut self) {
        for (_, (_, handle)) in self.0.by_ref() {
            handle.abort();
        }
    }
}
