//! CLI command implementations
//!
//! Startup order for every command: resolve configuration, install logging,
//! load the schema, then touch storage. Any failure along the way is fatal.

use std::path::Path;

use serde_json::json;
use tracing::warn;

use crate::observability::{init_logging, log_event, log_event_with_fields, Event};
use crate::rest_api::{AppState, BicycleServer};
use crate::schema::{Schema, SchemaValidator, ValidationMode};
use crate::storage::{BicycleStore, Provisioned};

use super::args::{Cli, Command};
use super::config::ServiceConfig;
use super::errors::{CliError, CliResult};
use super::io::{read_payload, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}

/// Run the appropriate command based on CLI args
pub fn run_command(cli: Cli) -> CliResult<()> {
    let config = ServiceConfig::resolve(&cli.overrides)?;
    init_logging(&config.log).map_err(CliError::config_error)?;

    log_event(Event::BootStart);
    let source = cli
        .overrides
        .config
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<defaults>".to_string());
    log_event_with_fields(Event::ConfigLoaded, &[("source", source.as_str())]);

    match cli.command {
        Command::Serve => serve(&config),
        Command::Provision => {
            let provisioned = provision(&config)?;
            write_response(json!(provisioned))
        }
        Command::Validate { file, partial } => validate(&config, &file, partial),
    }
}

/// Provision storage, then serve HTTP until Ctrl-C
pub fn serve(config: &ServiceConfig) -> CliResult<()> {
    let schema = load_schema(config)?;
    let store = open_store(config)?;
    store.provision()?;
    log_event(Event::ProvisionComplete);

    let server = BicycleServer::new(AppState::new(store, schema))
        .with_cors_origins(config.http.cors_origins.clone());
    let addr = config.http.bind_addr();

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime_error(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .serve(&addr, shutdown_signal())
            .await
            .map_err(|e| CliError::runtime_error(format!("HTTP server failed: {}", e)))
    })?;

    log_event(Event::ShutdownComplete);
    Ok(())
}

/// Create the configured database and table when missing
pub fn provision(config: &ServiceConfig) -> CliResult<Provisioned> {
    let store = open_store(config)?;
    let provisioned = store.provision()?;
    log_event(Event::ProvisionComplete);
    Ok(provisioned)
}

/// Check a payload file against the configured schema
pub fn validate(config: &ServiceConfig, file: &Path, partial: bool) -> CliResult<()> {
    let schema = load_schema(config)?;
    let payload = read_payload(file)?;

    let mode = if partial {
        ValidationMode::Partial
    } else {
        ValidationMode::Full
    };

    match SchemaValidator::new(&schema).validate(&payload, mode).into_result() {
        Ok(()) => write_response(json!({ "valid": true })),
        Err(report) => {
            write_error("BICYCLE_CLI_INVALID_PAYLOAD", "Invalid data", Some(json!(report)))?;
            Err(CliError::InvalidPayload(report))
        }
    }
}

fn load_schema(config: &ServiceConfig) -> CliResult<Schema> {
    let schema = config.schema_loader().load()?;
    let path = config.schema.path.display().to_string();
    let fields = schema.fields.len().to_string();
    log_event_with_fields(
        Event::SchemaLoaded,
        &[("path", path.as_str()), ("fields", fields.as_str())],
    );
    Ok(schema)
}

fn open_store(config: &ServiceConfig) -> CliResult<BicycleStore> {
    Ok(BicycleStore::new(config.open_backend()?, config.table_ref()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until killed.
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    log_event(Event::ShutdownStart);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::config::BackendKind;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA: &str = "\
bicycle_schema:
  brand: { type: string, required: true }
  model: { type: string, required: true }
  year: { type: integer, min: 1817 }
";

    fn create_config(temp_dir: &TempDir) -> ServiceConfig {
        let schema_path = temp_dir.path().join("bicycles.yml");
        fs::write(&schema_path, SCHEMA).unwrap();

        let mut config = ServiceConfig::default();
        config.store.data_dir = temp_dir.path().join("data");
        config.schema.path = schema_path;
        config
    }

    fn write_payload(temp_dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = temp_dir.path().join("payload.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_provision_is_idempotent_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);

        let first = provision(&config).unwrap();
        assert!(first.database_created);
        assert!(first.table_created);
        assert!(temp_dir
            .path()
            .join("data/bicycle_shop/bicycles.log")
            .exists());

        let second = provision(&config).unwrap();
        assert_eq!(second, Provisioned::default());
    }

    #[test]
    fn test_provision_memory_backend() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_config(&temp_dir);
        config.store.backend = BackendKind::Memory;

        let provisioned = provision(&config).unwrap();
        assert!(provisioned.database_created);
        assert!(!temp_dir.path().join("data").exists());
    }

    #[test]
    fn test_validate_accepts_valid_payload() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);
        let file = write_payload(&temp_dir, r#"{"brand": "Trek", "model": "X1"}"#);

        assert!(validate(&config, &file, false).is_ok());
    }

    #[test]
    fn test_validate_reports_violations() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);
        let file = write_payload(&temp_dir, r#"{"brand": "Trek", "year": 1700}"#);

        match validate(&config, &file, false) {
            Err(CliError::InvalidPayload(report)) => {
                assert_eq!(report.field("model"), Some(&["required field".to_string()][..]));
                assert_eq!(report.field("year"), Some(&["min value is 1817".to_string()][..]));
            }
            other => panic!("expected InvalidPayload, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_partial_skips_required() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir);
        let file = write_payload(&temp_dir, r#"{"model": "X2"}"#);

        assert!(validate(&config, &file, true).is_ok());
        assert!(validate(&config, &file, false).is_err());
    }

    #[test]
    fn test_missing_schema_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_config(&temp_dir);
        config.schema.path = temp_dir.path().join("missing.yml");
        let file = write_payload(&temp_dir, "{}");

        let err = validate(&config, &file, false).unwrap_err();
        assert_eq!(err.code(), "BICYCLE_CLI_SCHEMA_ERROR");
    }
}
