//! Document backend trait
//!
//! The seam between the resource store and whatever holds the documents.
//! A backend groups documents into tables inside databases, keys them by
//! the `id` primary key, and reports writes with per-kind counters.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use crate::schema::PRIMARY_KEY;

/// A stored document: a JSON object including its primary key.
pub type Document = Map<String, Value>;

/// Fully qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub database: String,
    pub table: String,
}

impl TableRef {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// Counters describing the effect of a single write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    pub inserted: u64,
    pub replaced: u64,
    pub unchanged: u64,
    pub deleted: u64,
    /// Primary keys assigned by the backend during an insert
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generated_keys: Vec<String>,
}

impl WriteResult {
    pub fn inserted(generated_key: Option<String>) -> Self {
        Self {
            inserted: 1,
            generated_keys: generated_key.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn replaced() -> Self {
        Self {
            replaced: 1,
            ..Default::default()
        }
    }

    pub fn unchanged() -> Self {
        Self {
            unchanged: 1,
            ..Default::default()
        }
    }

    pub fn deleted() -> Self {
        Self {
            deleted: 1,
            ..Default::default()
        }
    }

    /// Documents the write found, whether or not it changed them.
    pub fn matched(&self) -> u64 {
        self.replaced + self.unchanged
    }
}

/// Storage operations a document database provides.
///
/// Single-document operations are atomic with respect to each other;
/// nothing stronger is promised.
pub trait DocumentBackend: Send + Sync {
    fn database_exists(&self, database: &str) -> StoreResult<bool>;

    fn create_database(&self, database: &str) -> StoreResult<()>;

    fn table_exists(&self, table: &TableRef) -> StoreResult<bool>;

    fn create_table(&self, table: &TableRef) -> StoreResult<()>;

    /// Every document in the table, in no particular order.
    fn scan(&self, table: &TableRef) -> StoreResult<Vec<Document>>;

    fn get(&self, table: &TableRef, id: &str) -> StoreResult<Option<Document>>;

    /// Inserts a document, assigning a primary key when it has none.
    fn insert(&self, table: &TableRef, document: Document) -> StoreResult<WriteResult>;

    /// Merges `patch` into the document `id`. Missing documents are not created.
    fn update(&self, table: &TableRef, id: &str, patch: Document) -> StoreResult<WriteResult>;

    fn delete(&self, table: &TableRef, id: &str) -> StoreResult<WriteResult>;
}

/// Extracts the primary key of a document about to be inserted, generating
/// one when absent. Returns `(id, generated)`.
pub(crate) fn prepare_insert(document: &mut Document) -> StoreResult<(String, bool)> {
    match document.get(PRIMARY_KEY) {
        Some(Value::String(id)) => Ok((id.clone(), false)),
        Some(other) => Err(StoreError::InvalidKey(format!("expected a string, got {}", other))),
        None => {
            let id = Uuid::new_v4().to_string();
            document.insert(PRIMARY_KEY.to_string(), Value::String(id.clone()));
            Ok((id, true))
        }
    }
}

/// Applies `patch` to a copy of `existing`.
///
/// Nested objects are merged key by key; every other value replaces the
/// stored one. Returns `None` when the patch changes nothing.
pub(crate) fn merge_patch(id: &str, existing: &Document, patch: Document) -> StoreResult<Option<Document>> {
    if let Some(new_id) = patch.get(PRIMARY_KEY) {
        if new_id.as_str() != Some(id) {
            return Err(StoreError::PrimaryKeyChange(id.to_string()));
        }
    }

    let mut merged = existing.clone();
    merge_into(&mut merged, patch);

    if &merged == existing {
        Ok(None)
    } else {
        Ok(Some(merged))
    }
}

fn merge_into(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        if let Value::Object(nested) = value {
            if let Some(Value::Object(current)) = target.get_mut(&key) {
                merge_into(current, nested);
                continue;
            }
            target.insert(key, Value::Object(nested));
        } else {
            target.insert(key, value);
        }
    }
}
