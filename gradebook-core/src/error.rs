//! Structured error types for gradebook-core.
//!
//! Uses `thiserror` for better API surface and error composition.
//! The server binary can still wrap these in `anyhow` for convenience,
//! but library consumers get structured, composable errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration errors.
///
/// Everything here is raised before the first request is served: either
/// while reading the config file or while validating identifiers at
/// repository construction. None of these are per-request conditions.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configured column, table, or schema name failed validation.
    #[error("invalid {label} '{value}': only letters, numbers, and underscores are allowed")]
    InvalidIdentifier { label: &'static str, value: String },

    /// Config file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML.
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A required setting has no value from file or environment.
    #[error("missing required setting: {what}")]
    Missing { what: &'static str },
}

impl ConfigError {
    pub fn invalid_identifier(label: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            label,
            value: value.into(),
        }
    }

    pub fn missing(what: &'static str) -> Self {
        Self::Missing { what }
    }
}
