//! Lifecycle events
//!
//! Events are explicit and typed; each one has a stable name that appears
//! as the `event` field of the log line.

use std::fmt;

/// Observable lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Startup begins
    BootStart,
    /// Configuration loaded
    ConfigLoaded,
    /// Schema loaded from its declarative source
    SchemaLoaded,

    // Provisioning
    /// Database did not exist and was created
    DatabaseCreated,
    /// Table did not exist and was created
    TableCreated,
    /// Database and table are ready
    ProvisionComplete,

    // Serving
    /// HTTP listener bound
    ServerListening,
    /// Shutdown signal received
    ShutdownStart,
    /// In-flight requests drained
    ShutdownComplete,
}

impl Event {
    /// Returns the stable event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::DatabaseCreated => "DATABASE_CREATED",
            Event::TableCreated => "TABLE_CREATED",
            Event::ProvisionComplete => "PROVISION_COMPLETE",
            Event::ServerListening => "SERVER_LISTENING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
