//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → consumed once at startup by observability, router and host
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ConfigError};
pub use schema::AppConfig;
pub use schema::EnrichmentConfig;
pub use schema::HostConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::LoggingConfig;
pub use schema::MetricsConfig;
pub use schema::ServiceConfig;
pub use schema::TracingConfig;
