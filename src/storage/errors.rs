//! Storage error types
//!
//! None of these are retried. The HTTP layer surfaces every one of them as
//! a server error.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by document backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// Disk I/O failure
    #[error("storage I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A document could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A log record failed its checksum or could not be parsed
    #[error("data corruption in {path} at line {line}: {reason}")]
    Corruption {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("database '{0}' does not exist")]
    DatabaseNotFound(String),

    #[error("table '{database}.{table}' does not exist")]
    TableNotFound { database: String, table: String },

    /// Create called for a database or table that is already there
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    /// Insert with a primary key that is already taken
    #[error("duplicate primary key '{0}'")]
    DuplicateKey(String),

    /// Primary key present but not a string
    #[error("invalid primary key: {0}")]
    InvalidKey(String),

    /// Update attempted to change the primary key
    #[error("primary key of '{0}' cannot be changed")]
    PrimaryKeyChange(String),

    /// Backend cannot serve requests (e.g. poisoned lock)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn table_not_found(database: &str, table: &str) -> Self {
        Self::TableNotFound {
            database: database.to_string(),
            table: table.to_string(),
        }
    }

    /// Corruption is never recoverable without operator action.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Corruption { .. })
    }
}
