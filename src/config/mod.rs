//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or built-in defaults
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RegistryConfig (validated, immutable)
//!     → http::registry builds one HttpClient per ClientConfig
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; clients are built from it exactly once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientConfig, LogFormat, ObservabilityConfig, Protocol, RegistryConfig, TracingMode,
    DEFAULT_TIMEOUT_SECS, HTTP11_CLIENT, HTTP2_CLIENT,
};
