//! Service orchestration.
//!
//! # Responsibilities
//! - Start every configured dependency before traffic is accepted
//! - Hand the listener to the lifecycle controller and wait for it to stop
//! - Turn the controller's outcome into a single service result
//!
//! # Design Decisions
//! - Fail fast: a dependency failure means the listener is never bound
//! - The cancellation source is injected so tests can stop the service

use std::sync::Arc;

use axum::Router;

use crate::config::{ServiceConfig, LISTEN_ADDRESS};
use crate::dependencies;
use crate::error::ServiceError;
use crate::http::build_router;
use crate::lifecycle::{CancellationSource, Dependency, ServiceLifecycleController};
use crate::net::HttpListenerFactory;

/// A configured service, ready to start.
pub struct Service {
    config: ServiceConfig,
    dependencies: Vec<Arc<dyn Dependency>>,
    listener: HttpListenerFactory,
    handler: Router,
}

impl Service {
    /// Build the service from configuration, listening on the fixed endpoint.
    pub fn new(config: ServiceConfig) -> Self {
        let dependencies = dependencies::from_config(&config.dependencies);
        let handler = build_router(&config.server);

        Self {
            config,
            dependencies,
            listener: HttpListenerFactory::new(LISTEN_ADDRESS),
            handler,
        }
    }

    /// Replace the listener.
    pub fn with_listener(mut self, listener: HttpListenerFactory) -> Self {
        self.listener = listener;
        self
    }

    /// Replace the request handler.
    pub fn with_handler(mut self, handler: Router) -> Self {
        self.handler = handler;
        self
    }

    /// Replace the dependencies built from configuration.
    pub fn with_dependencies(mut self, dependencies: Vec<Arc<dyn Dependency>>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Start dependencies, then serve until `cancellation` fires or the listener fails.
    pub async fn run<C>(self, cancellation: C) -> Result<(), ServiceError>
    where
        C: CancellationSource,
    {
        let strategy = self.config.startup.strategy;
        tracing::info!(
            strategy = %strategy,
            dependencies = self.dependencies.len(),
            "Starting dependencies"
        );
        strategy.start(&self.dependencies).await?;

        let controller = ServiceLifecycleController::from_config(&self.config.shutdown);
        let outcome = controller
            .run(self.listener, self.handler, cancellation)
            .await?;
        outcome.into_result()?;

        Ok(())
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("config", &self.config)
            .field(
                "dependencies",
                &self.dependencies.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .field("listener", &self.listener)
            .finish()
    }
}
