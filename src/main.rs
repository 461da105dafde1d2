//! Service lifecycle runner.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ ServiceConfig ──▶ dependencies (tcp / http)
//!                                          │
//!                                          ▼
//!                              startup: connect all, declared-order errors
//!                                          │ ok
//!                                          ▼
//!   SIGTERM/SIGINT ──▶ TerminateSignal ──▶ ServiceLifecycleController
//!                                          │  bind 0.0.0.0:8080
//!                                          │  serve (axum) ◀── requests
//!                                          │  drain on signal
//!                                          ▼
//!                              ShutdownOutcome (drain + serve errors joined)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use service_lifecycle::config::{self, ServiceConfig, LISTEN_ADDRESS};
use service_lifecycle::lifecycle::{StartupStrategy, TerminateSignal};
use service_lifecycle::observability::{logging, metrics};
use service_lifecycle::{Service, ServiceError};

#[derive(Parser)]
#[command(name = "service-lifecycle")]
#[command(about = "Start dependencies, serve HTTP, and shut down gracefully", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured dependency startup strategy.
    #[arg(short, long, value_enum)]
    strategy: Option<Strategy>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Strategy {
    Concurrent,
    Sequential,
}

impl From<Strategy> for StartupStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Concurrent => StartupStrategy::Concurrent,
            Strategy::Sequential => StartupStrategy::Sequential,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match config::load_config(path) {
            Ok(config) => config,
            Err(e) => {
                // Logging is configured from the file, so it is not up yet.
                eprintln!("Failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ServiceConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config.startup.strategy = strategy.into();
    }

    logging::init_logging(&config.observability);
    tracing::info!("service-lifecycle v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        listen_address = LISTEN_ADDRESS,
        dependencies = config.dependencies.len(),
        strategy = %config.startup.strategy,
        drain_timeout_secs = config.shutdown.drain_timeout_secs,
        "Configuration loaded"
    );

    finish(run(config).await)
}

/// Report the result once and map it to the process exit status.
fn finish(result: Result<(), ServiceError>) -> ExitCode {
    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServiceConfig) -> Result<(), ServiceError> {
    if config.observability.metrics_enabled {
        // Validated at load time; the default config has metrics disabled.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    let service = Service::new(config);
    let signal = TerminateSignal::install().map_err(ServiceError::Signal)?;
    service.run(signal).await
}

fn report(error: &ServiceError) {
    match error {
        ServiceError::Startup(e) => tracing::error!(
            index = e.index(),
            dependency = e.name(),
            error = %e,
            "Failed to start dependencies"
        ),
        ServiceError::Shutdown(e) => {
            if let Some(drain) = e.drain() {
                tracing::error!(error = %drain, "Failed to drain HTTP server");
            }
            if let Some(serve) = e.serve() {
                tracing::error!(error = %serve, "HTTP server failed");
            }
        }
        other => tracing::error!(error = %other, "Service failed"),
    }
}
