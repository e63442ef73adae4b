//! Logging for the bicycle service
//!
//! Structured logging goes through `tracing`. `init_logging` installs the
//! process-wide subscriber once at startup; lifecycle milestones are logged
//! as typed `Event`s so they are easy to grep for.
//!
//! ```ignore
//! use bicycle_api::observability::{init_logging, log_event, Event, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! log_event(Event::BootStart);
//! ```

mod events;

pub use events::Event;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Installs the global tracing subscriber. Log lines go to stderr; stdout
/// is reserved for command output.
///
/// Fails if the filter directive is invalid or a subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) if !directive.is_empty() => EnvFilter::try_new(directive),
        _ => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| format!("invalid log filter: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| format!("failed to install log subscriber: {}", e))
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    tracing::info!(event = event.as_str());
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let rendered: Vec<String> = fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    tracing::info!(event = event.as_str(), fields = %rendered.join(" "));
}
