//! Schema loader for reading the declarative schema file at startup
//!
//! The file is YAML (or JSON when the extension is `.json`) with a
//! top-level mapping; one entry of that mapping holds the field rules:
//!
//! ```yaml
//! bicycle_schema:
//!   brand:
//!     type: string
//!     required: true
//! ```
//!
//! A missing or malformed file aborts startup.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldDef, Schema, UnknownFieldPolicy};

/// Loads a named schema from a file.
pub struct SchemaLoader {
    path: PathBuf,
    key: String,
    unknown_fields: UnknownFieldPolicy,
}

impl SchemaLoader {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            unknown_fields: UnknownFieldPolicy::default(),
        }
    }

    /// Sets the unknown-field policy attached to the loaded schema.
    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the schema file.
    pub fn load(&self) -> SchemaResult<Schema> {
        let content = fs::read_to_string(&self.path).map_err(|source| SchemaError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.parse(&content)
    }

    /// Parses schema text using the format implied by the loader's path.
    pub fn parse(&self, content: &str) -> SchemaResult<Schema> {
        let mut document: BTreeMap<String, BTreeMap<String, FieldDef>> = if self.is_json() {
            serde_json::from_str(content).map_err(|e| SchemaError::malformed(&self.path, e))?
        } else {
            serde_yaml::from_str(content).map_err(|e| SchemaError::malformed(&self.path, e))?
        };

        let fields = document
            .remove(&self.key)
            .ok_or_else(|| SchemaError::MissingKey {
                path: self.path.clone(),
                key: self.key.clone(),
            })?;

        if fields.is_empty() {
            return Err(SchemaError::malformed(
                &self.path,
                format!("schema '{}' declares no fields", self.key),
            ));
        }

        Schema::new(self.key.clone(), fields, self.unknown_fields)
    }

    fn is_json(&self) -> bool {
        self.path.extension().map_or(false, |ext| ext == "json")
    }
}
