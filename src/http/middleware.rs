//! In-flight request limiting and request metrics.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Semaphore;

use crate::http::request::request_id;
use crate::observability::metrics;

/// Bounds the number of requests handled at once.
///
/// Requests beyond the limit wait for a slot (backpressure) rather than being
/// rejected.
#[derive(Debug, Clone)]
pub struct InFlightLimit {
    permits: Arc<Semaphore>,
    max_in_flight: usize,
}

impl InFlightLimit {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    /// Requests currently being handled.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

pub async fn track_requests(
    State(limit): State<InFlightLimit>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let id = request_id(&request).to_string();

    // The semaphore is never closed.
    let Ok(_permit) = limit.permits.clone().acquire_owned().await else {
        return axum::http::StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let response = next.run(request).await;
    let status = response.status().as_u16();
    metrics::record_request(&method, status, start);

    tracing::debug!(
        request_id = %id,
        method = %method,
        path = %path,
        status = status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}
