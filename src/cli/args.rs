//! CLI argument definitions using clap
//!
//! Commands:
//! - bicycle-api serve [--config <path>]
//! - bicycle-api provision [--config <path>]
//! - bicycle-api validate --file <payload.json> [--partial]
//!
//! Every setting flag also reads its `BICYCLES_*` environment variable.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::config::BackendKind;

/// Bicycle inventory service - CRUD over a schema-validated document store
#[derive(Parser, Debug)]
#[command(name = "bicycle-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings that override the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Path to JSON configuration file
    #[arg(long, global = true, env = "BICYCLES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, global = true, env = "BICYCLES_HOST")]
    pub host: Option<String>,

    /// Port to bind
    #[arg(long, global = true, env = "BICYCLES_PORT")]
    pub port: Option<u16>,

    /// Storage backend
    #[arg(long, global = true, value_enum, env = "BICYCLES_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Data directory of the file backend
    #[arg(long, global = true, env = "BICYCLES_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Database name
    #[arg(long, global = true, env = "BICYCLES_DB")]
    pub database: Option<String>,

    /// Table name
    #[arg(long, global = true, env = "BICYCLES_TABLE")]
    pub table: Option<String>,

    /// Schema file (YAML or JSON)
    #[arg(long, global = true, env = "BICYCLES_SCHEMA")]
    pub schema: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision storage and serve the HTTP API until interrupted
    Serve,

    /// Create the database and table if missing, then exit
    Provision,

    /// Validate a JSON payload file against the configured schema
    Validate {
        /// Payload to check
        #[arg(long)]
        file: PathBuf,

        /// Check as an update (required fields not enforced)
        #[arg(long)]
        partial: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
