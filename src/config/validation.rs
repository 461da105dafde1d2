//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Dependency names are unique; endpoints are well-formed
//! - Value ranges (timeouts > 0, limits > 0 and within semaphore capacity)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::Uri;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::{DependencyKind, ServiceConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("dependency #{0} has an empty name")]
    EmptyDependencyName(usize),

    #[error("dependency '{0}' is declared more than once")]
    DuplicateDependency(String),

    #[error("dependency '{name}': address '{address}' is not host:port")]
    InvalidAddress { name: String, address: String },

    #[error("dependency '{name}': url '{url}' is not an http:// URL with a host")]
    InvalidUrl { name: String, url: String },

    #[error("dependency '{0}': connect_timeout_secs must be greater than 0")]
    ZeroConnectTimeout(String),

    #[error("server.max_in_flight must be greater than 0")]
    ZeroMaxInFlight,

    #[error("server.max_in_flight must be at most {max}, got {value}")]
    MaxInFlightTooLarge { value: usize, max: usize },

    #[error("server.request_timeout_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, dependency) in config.dependencies.iter().enumerate() {
        let name = dependency.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyDependencyName(index));
        } else if !seen.insert(name) {
            errors.push(ValidationError::DuplicateDependency(name.to_string()));
        }

        if dependency.connect_timeout_secs == 0 {
            errors.push(ValidationError::ZeroConnectTimeout(dependency.name.clone()));
        }

        match &dependency.kind {
            DependencyKind::Tcp { address } => {
                if !is_host_port(address) {
                    errors.push(ValidationError::InvalidAddress {
                        name: dependency.name.clone(),
                        address: address.clone(),
                    });
                }
            }
            DependencyKind::Http { url } => {
                if !is_http_url(url) {
                    errors.push(ValidationError::InvalidUrl {
                        name: dependency.name.clone(),
                        url: url.clone(),
                    });
                }
            }
        }
    }

    if config.server.max_in_flight == 0 {
        errors.push(ValidationError::ZeroMaxInFlight);
    } else if config.server.max_in_flight > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::MaxInFlightTooLarge {
            value: config.server.max_in_flight,
            max: Semaphore::MAX_PERMITS,
        });
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

fn is_http_url(url: &str) -> bool {
    match url.parse::<Uri>() {
        Ok(uri) => uri.scheme_str() == Some("http") && uri.authority().is_some(),
        Err(_) => false,
    }
}
