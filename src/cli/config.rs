//! Service configuration
//!
//! Loaded from an optional JSON file; every section and key has a default,
//! so an absent file yields a runnable configuration. Command line flags
//! (and their `BICYCLES_*` environment variables) override single values.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::observability::LogConfig;
use crate::schema::{SchemaLoader, UnknownFieldPolicy};
use crate::storage::{DocumentBackend, FileBackend, MemoryBackend, TableRef};

use super::args::Overrides;
use super::errors::{CliError, CliResult};

/// Which document backend holds the bicycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Durable append-only logs under `data_dir`
    #[default]
    File,
    /// Process memory; lost on exit
    Memory,
}

/// HTTP section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Address or hostname to bind
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty means permissive
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl HttpConfig {
    /// `host:port`, resolved when the listener binds
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Storage section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_table")]
    pub table: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_database() -> String {
    "bicycle_shop".to_string()
}
fn default_table() -> String {
    "bicycles".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: default_data_dir(),
            database: default_database(),
            table: default_table(),
        }
    }
}

/// Schema section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    #[serde(default = "default_schema_path")]
    pub path: PathBuf,

    /// Top-level key holding the field rules
    #[serde(default = "default_schema_key")]
    pub key: String,

    #[serde(default)]
    pub unknown_fields: UnknownFieldPolicy,
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schemas/bicycles.yml")
}
fn default_schema_key() -> String {
    "bicycle_schema".to_string()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            path: default_schema_path(),
            key: default_schema_key(),
            unknown_fields: UnknownFieldPolicy::default(),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub schema: SchemaConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl ServiceConfig {
    /// Load configuration from file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))
    }

    /// Load, apply overrides and validate
    pub fn resolve(overrides: &Overrides) -> CliResult<Self> {
        let mut config = Self::load(overrides.config.as_deref())?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(host) = &overrides.host {
            self.http.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.http.port = port;
        }
        if let Some(backend) = overrides.backend {
            self.store.backend = backend;
        }
        if let Some(data_dir) = &overrides.data_dir {
            self.store.data_dir = data_dir.clone();
        }
        if let Some(database) = &overrides.database {
            self.store.database = database.clone();
        }
        if let Some(table) = &overrides.table {
            self.store.table = table.clone();
        }
        if let Some(schema) = &overrides.schema {
            self.schema.path = schema.clone();
        }
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> CliResult<()> {
        if self.http.host.trim().is_empty() {
            return Err(CliError::config_error("http.host must not be empty"));
        }
        if self.http.port == 0 {
            return Err(CliError::config_error("http.port must be > 0"));
        }

        check_name("store.database", &self.store.database)?;
        check_name("store.table", &self.store.table)?;

        if self.schema.key.is_empty() {
            return Err(CliError::config_error("schema.key must not be empty"));
        }

        Ok(())
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(self.store.database.clone(), self.store.table.clone())
    }

    pub fn schema_loader(&self) -> SchemaLoader {
        SchemaLoader::new(self.schema.path.clone(), self.schema.key.clone())
            .with_unknown_fields(self.schema.unknown_fields)
    }

    /// Open the configured backend
    pub fn open_backend(&self) -> CliResult<Arc<dyn DocumentBackend>> {
        let backend: Arc<dyn DocumentBackend> = match self.store.backend {
            BackendKind::File => Arc::new(FileBackend::open(self.store.data_dir.clone())?),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(backend)
    }
}

/// Database and table names become path components of the file backend.
fn check_name(setting: &str, name: &str) -> CliResult<()> {
    if name.is_empty() {
        return Err(CliError::config_error(format!("{} must not be empty", setting)));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(CliError::config_error(format!(
            "Invalid {}: '{}'. Path separators are not allowed.",
            setting, name
        )));
    }
    Ok(())
}
