//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that the default client names a defined or built-in client
//! - Detect duplicate and empty client names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - A zero timeout is not an error; it falls back to the default at use
//!   and is only warned about here

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::{RegistryConfig, HTTP11_CLIENT, HTTP2_CLIENT};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyClientName { index: usize },
    DuplicateClient(String),
    UnknownDefaultClient(String),
    InvalidLogLevel(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyClientName { index } => {
                write!(f, "client #{} has an empty name", index)
            }
            ValidationError::DuplicateClient(name) => {
                write!(f, "client '{}' is defined more than once", name)
            }
            ValidationError::UnknownDefaultClient(name) => {
                write!(f, "default client '{}' is not defined", name)
            }
            ValidationError::InvalidLogLevel(level) => {
                write!(f, "invalid log level '{}'", level)
            }
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a registry configuration.
pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, client) in config.clients.iter().enumerate() {
        if client.name.trim().is_empty() {
            errors.push(ValidationError::EmptyClientName { index });
            continue;
        }
        if !seen.insert(client.name.as_str()) {
            errors.push(ValidationError::DuplicateClient(client.name.clone()));
        }
        if client.timeout_secs == 0 {
            tracing::warn!(client = %client.name, "timeout_secs is 0, using default timeout");
        }
    }

    if let Some(default) = &config.default_client {
        let builtin = default == HTTP11_CLIENT || default == HTTP2_CLIENT;
        if !builtin && !seen.contains(default.as_str()) {
            errors.push(ValidationError::UnknownDefaultClient(default.clone()));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
