//! HTTP handler assembly.
//!
//! # Responsibilities
//! - Create the Axum Router the listener serves
//! - Wire up middleware (tracing, timeout, body limit, request ID, backpressure)

use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::middleware::{track_requests, InFlightLimit};
use crate::http::request::{PropagateRequestIdLayer, SetRequestIdLayer, UuidRequestId};

/// Build the service's default handler.
pub fn build_router(config: &ServerConfig) -> Router {
    with_layers(Router::new().route("/", get(root)), config)
}

/// Wrap a handler with the standard middleware stack.
#[allow(deprecated)]
pub fn with_layers(router: Router, config: &ServerConfig) -> Router {
    let limit = InFlightLimit::new(config.max_in_flight);

    router
        .layer(middleware::from_fn_with_state(limit, track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
        )
}

async fn root() -> &'static str {
    "Ok"
}
