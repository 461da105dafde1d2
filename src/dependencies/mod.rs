//! Concrete backing dependencies.
//!
//! # Data Flow
//! ```text
//! [[dependencies]] config entries (declared order)
//!     → from_config
//!     → Vec<Arc<dyn Dependency>>
//!     → lifecycle::startup (concurrent or sequential)
//! ```
//!
//! # Design Decisions
//! - Each dependency owns its connection; the coordinator only sees the result
//! - Every connect is bounded by its own timeout; there are no retries

use std::sync::Arc;

use crate::config::{DependencyConfig, DependencyKind};
use crate::lifecycle::Dependency;

pub mod http;
pub mod tcp;

pub use self::http::HttpDependency;
pub use self::tcp::TcpDependency;

/// Build dependencies from configuration, preserving declared order.
pub fn from_config(configs: &[DependencyConfig]) -> Vec<Arc<dyn Dependency>> {
    configs
        .iter()
        .map(|config| -> Arc<dyn Dependency> {
            match &config.kind {
                DependencyKind::Tcp { address } => Arc::new(TcpDependency::new(
                    &config.name,
                    address,
                    config.connect_timeout(),
                )),
                DependencyKind::Http { url } => Arc::new(HttpDependency::new(
                    &config.name,
                    url,
                    config.connect_timeout(),
                )),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_preserves_order() {
        let configs = vec![
            DependencyConfig {
                name: "database".into(),
                kind: DependencyKind::Tcp {
                    address: "127.0.0.1:5432".into(),
                },
                connect_timeout_secs: 1,
            },
            DependencyConfig {
                name: "search".into(),
                kind: DependencyKind::Http {
                    url: "http://127.0.0.1:9200/".into(),
                },
                connect_timeout_secs: 1,
            },
        ];

        let names: Vec<_> = from_config(&configs)
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["database", "search"]);
    }
}
