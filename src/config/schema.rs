//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lifecycle::StartupStrategy;

/// Fixed endpoint the service listens on.
pub const LISTEN_ADDRESS: &str = "0.0.0.0:8080";

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Request handling limits.
    pub server: ServerConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Dependency startup settings.
    pub startup: StartupConfig,

    /// Backing dependencies, in declared order.
    pub dependencies: Vec<DependencyConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Request handling limits for the HTTP listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Maximum requests handled at once (backpressure).
    pub max_in_flight: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 10_000,
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Drain deadline in seconds. `0` waits for in-flight requests indefinitely.
    pub drain_timeout_secs: u64,
}

impl ShutdownConfig {
    pub fn drain_deadline(&self) -> Option<Duration> {
        (self.drain_timeout_secs > 0).then(|| Duration::from_secs(self.drain_timeout_secs))
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 30,
        }
    }
}

/// Dependency startup configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StartupConfig {
    /// `concurrent` (default) or `sequential`.
    pub strategy: StartupStrategy,
}

/// A backing dependency the service connects to before serving.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencyConfig {
    /// Unique dependency identifier.
    pub name: String,

    /// How to reach the dependency.
    #[serde(flatten)]
    pub kind: DependencyKind,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl DependencyConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_connect_timeout() -> u64 {
    5
}

/// Dependency transport.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DependencyKind {
    /// Plain TCP connect (databases, caches, brokers).
    Tcp {
        /// `host:port`
        address: String,
    },

    /// HTTP GET that must answer with a 2xx status.
    Http {
        /// `http://host:port/path`
        url: String,
    },
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
