//! The bicycle resource store
//!
//! Maps the five resource operations onto a document backend table and
//! owns the startup provisioning of that table.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::backend::{Document, DocumentBackend, TableRef};
use super::errors::{StoreError, StoreResult};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::PRIMARY_KEY;

/// A stored bicycle: its identifier plus whatever attributes the schema allows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bicycle {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Bicycle {
    /// Converts a stored document, splitting off its primary key.
    pub fn from_document(mut document: Document) -> StoreResult<Self> {
        match document.remove(PRIMARY_KEY) {
            Some(Value::String(id)) => Ok(Self {
                id,
                attributes: document,
            }),
            other => Err(StoreError::InvalidKey(format!(
                "stored document has primary key {:?}",
                other
            ))),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }
}

/// What startup provisioning had to create
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Provisioned {
    pub database_created: bool,
    pub table_created: bool,
}

/// Resource store for bicycles, bound to one database table
#[derive(Clone)]
pub struct BicycleStore {
    backend: Arc<dyn DocumentBackend>,
    table: TableRef,
}

impl fmt::Debug for BicycleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BicycleStore")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl BicycleStore {
    pub fn new(backend: Arc<dyn DocumentBackend>, table: TableRef) -> Self {
        Self { backend, table }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Creates the database and table when missing. Idempotent.
    ///
    /// Run once at startup, before the first request is served.
    pub fn provision(&self) -> StoreResult<Provisioned> {
        let mut provisioned = Provisioned::default();

        if !self.backend.database_exists(&self.table.database)? {
            self.backend.create_database(&self.table.database)?;
            provisioned.database_created = true;
            log_event_with_fields(Event::DatabaseCreated, &[("database", self.table.database.as_str())]);
        }

        if !self.backend.table_exists(&self.table)? {
            self.backend.create_table(&self.table)?;
            provisioned.table_created = true;
            let table = self.table.to_string();
            log_event_with_fields(Event::TableCreated, &[("table", table.as_str())]);
        }

        Ok(provisioned)
    }

    /// Every bicycle, unordered.
    pub fn list_all(&self) -> StoreResult<Vec<Bicycle>> {
        self.backend
            .scan(&self.table)?
            .into_iter()
            .map(Bicycle::from_document)
            .collect()
    }

    pub fn get(&self, id: &str) -> StoreResult<Option<Bicycle>> {
        self.backend
            .get(&self.table, id)?
            .map(Bicycle::from_document)
            .transpose()
    }

    /// Persists a new bicycle and returns its identifier, generated when
    /// the payload carries none.
    pub fn create(&self, payload: Document) -> StoreResult<String> {
        let supplied = payload
            .get(PRIMARY_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned);

        let result = self.backend.insert(&self.table, payload)?;
        let id = match (result.generated_keys.into_iter().next(), supplied) {
            (Some(generated), _) => generated,
            (None, Some(supplied)) => supplied,
            (None, None) => {
                return Err(StoreError::InvalidKey(
                    "insert reported neither a supplied nor a generated key".to_string(),
                ))
            }
        };

        debug!(id = %id, "bicycle created");
        Ok(id)
    }

    /// Merges `patch` into bicycle `id`. Returns the number of records
    /// matched: 0 when `id` does not exist (nothing is inserted).
    pub fn update(&self, id: &str, patch: Document) -> StoreResult<u64> {
        let result = self.backend.update(&self.table, id, patch)?;
        debug!(id = %id, replaced = result.replaced, unchanged = result.unchanged, "bicycle updated");
        Ok(result.matched())
    }

    /// Removes bicycle `id`. Returns the number of records deleted.
    pub fn delete(&self, id: &str) -> StoreResult<u64> {
        let result = self.backend.delete(&self.table, id)?;
        debug!(id = %id, deleted = result.deleted, "bicycle deleted");
        Ok(result.deleted)
    }
}
