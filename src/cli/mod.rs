//! CLI module for the bicycle service
//!
//! Provides command-line interface for:
//! - serve: provision storage and run the HTTP API
//! - provision: idempotent database/table creation
//! - validate: check a payload file against the schema

mod args;
mod commands;
pub mod config;
mod errors;
mod io;

pub use args::{Cli, Command, Overrides};
pub use commands::{provision, run, run_command, serve, validate};
pub use config::{BackendKind, HttpConfig, SchemaConfig, ServiceConfig, StoreConfig};
pub use errors::{CliError, CliResult};
pub use io::{read_payload, write_error, write_response};
