//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! startup, lifecycle controller, HTTP middleware produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted messages
//! - Request ID flows through the HTTP layer
//! - Metrics are cheap (atomic increments) and optional

pub mod logging;
pub mod metrics;
