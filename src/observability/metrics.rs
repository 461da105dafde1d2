//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dependency_connect_total` (counter): connection attempts by dependency, outcome
//! - `dependency_connect_duration_seconds` (histogram): connect latency by dependency
//! - `startup_duration_seconds` (histogram): total startup time by strategy, outcome
//! - `lifecycle_state` (gauge): 0=starting, 1=serving, 2=draining, 3=stopped
//! - `shutdown_total` (counter): completed lifecycles by outcome
//! - `http_requests_total` (counter): requests by method, status
//! - `http_request_duration_seconds` (histogram): request latency by method
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter serves its own HTTP endpoint

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::LifecycleState;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "failure"
    }
}

pub fn record_dependency_connect(dependency: &str, ok: bool, start: Instant) {
    let dependency = dependency.to_string();
    counter!(
        "dependency_connect_total",
        "dependency" => dependency.clone(),
        "outcome" => outcome(ok)
    )
    .increment(1);
    histogram!("dependency_connect_duration_seconds", "dependency" => dependency)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_startup(strategy: &'static str, ok: bool, start: Instant) {
    histogram!(
        "startup_duration_seconds",
        "strategy" => strategy,
        "outcome" => outcome(ok)
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_lifecycle_state(state: LifecycleState) {
    let value = match state {
        LifecycleState::Starting => 0.0,
        LifecycleState::Serving => 1.0,
        LifecycleState::Draining => 2.0,
        LifecycleState::Stopped => 3.0,
    };
    gauge!("lifecycle_state").set(value);
}

pub fn record_shutdown(ok: bool) {
    counter!("shutdown_total", "outcome" => outcome(ok)).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("http_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}
