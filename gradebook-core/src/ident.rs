//! Identifier validation for generated SQL.
//!
//! The warehouse query language parameterizes values only, never column or
//! table names, so every identifier that reaches query text must come from
//! this allow-list first. `SafeIdentifier` can only be built through
//! [`SafeIdentifier::new`], which keeps unvalidated strings out of SQL by
//! construction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;

/// ASCII letters, digits, underscore; at least one character.
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("invalid identifier regex"));

/// A column, table, or schema name that has passed allow-list validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeIdentifier(String);

impl SafeIdentifier {
    /// Validate a configured identifier.
    ///
    /// `label` is the human-readable name used in the error ("order
    /// column", "course table", ...). Called once per configured
    /// identifier, at repository construction, so bad configuration fails
    /// before any query runs.
    pub fn new(candidate: &str, label: &'static str) -> Result<Self, ConfigError> {
        if !IDENT_RE.is_match(candidate) {
            return Err(ConfigError::invalid_identifier(label, candidate));
        }
        Ok(Self(candidate.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SafeIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SafeIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
