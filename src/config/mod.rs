//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → passed by reference to startup and the lifecycle controller
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The listen address is fixed and not part of the schema

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DependencyConfig, DependencyKind, ObservabilityConfig, ServerConfig, ServiceConfig,
    ShutdownConfig, StartupConfig, LISTEN_ADDRESS,
};
pub use validation::{validate_config, ValidationError};
