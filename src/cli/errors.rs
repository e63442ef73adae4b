//! CLI-specific error types
//!
//! Every CLI error is fatal: `main` prints it and exits non-zero.

use std::io;

use thiserror::Error;

use crate::schema::{SchemaError, ValidationReport};
use crate::storage::StoreError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file or override is unusable
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `validate` found violations
    #[error("payload failed validation ({} field(s))", .0.errors().len())]
    InvalidPayload(ValidationReport),

    /// Async runtime or HTTP server failed
    #[error("{0}")]
    Runtime(String),
}

impl CliError {
    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Runtime error
    pub fn runtime_error(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "BICYCLE_CLI_CONFIG_ERROR",
            Self::Schema(_) => "BICYCLE_CLI_SCHEMA_ERROR",
            Self::Store(_) => "BICYCLE_CLI_STORE_ERROR",
            Self::Io(_) | Self::Json(_) => "BICYCLE_CLI_IO_ERROR",
            Self::InvalidPayload(_) => "BICYCLE_CLI_INVALID_PAYLOAD",
            Self::Runtime(_) => "BICYCLE_CLI_RUNTIME_ERROR",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
