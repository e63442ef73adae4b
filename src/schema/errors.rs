//! Schema loading errors
//!
//! Every variant here is fatal at startup: the service refuses to serve
//! writes without a usable schema.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for schema loading
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while loading or building a schema
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema file could not be read
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Schema file is not valid YAML/JSON or a rule set is malformed
    #[error("malformed schema in {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The named schema entry is not present in the file
    #[error("schema '{key}' not found in {path}")]
    MissingKey { path: PathBuf, key: String },

    /// A rule set is structurally inconsistent (e.g. `min` on a string)
    #[error("invalid rule for field '{field}': {reason}")]
    InvalidRule { field: String, reason: String },
}

impl SchemaError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_rule(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
