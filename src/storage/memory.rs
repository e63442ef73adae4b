//! In-memory document backend
//!
//! Databases and tables are nested maps behind a single `RwLock`. Nothing
//! survives a restart; used by tests and the `memory` backend setting.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::backend::{merge_patch, prepare_insert, Document, DocumentBackend, TableRef, WriteResult};
use super::errors::{StoreError, StoreResult};

type Table = HashMap<String, Document>;
type Database = HashMap<String, Table>;

/// Volatile backend keeping every document in process memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    databases: RwLock<HashMap<String, Database>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, Database>>> {
        self.databases
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, Database>>> {
        self.databases
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

fn table<'a>(databases: &'a HashMap<String, Database>, t: &TableRef) -> StoreResult<&'a Table> {
    databases
        .get(&t.database)
        .ok_or_else(|| StoreError::DatabaseNotFound(t.database.clone()))?
        .get(&t.table)
        .ok_or_else(|| StoreError::table_not_found(&t.database, &t.table))
}

fn table_mut<'a>(
    databases: &'a mut HashMap<String, Database>,
    t: &TableRef,
) -> StoreResult<&'a mut Table> {
    databases
        .get_mut(&t.database)
        .ok_or_else(|| StoreError::DatabaseNotFound(t.database.clone()))?
        .get_mut(&t.table)
        .ok_or_else(|| StoreError::table_not_found(&t.database, &t.table))
}

impl DocumentBackend for MemoryBackend {
    fn database_exists(&self, database: &str) -> StoreResult<bool> {
        Ok(self.read()?.contains_key(database))
    }

    fn create_database(&self, database: &str) -> StoreResult<()> {
        let mut databases = self.write()?;
        if databases.contains_key(database) {
            return Err(StoreError::AlreadyExists(database.to_string()));
        }
        databases.insert(database.to_string(), Database::new());
        Ok(())
    }

    fn table_exists(&self, t: &TableRef) -> StoreResult<bool> {
        Ok(self
            .read()?
            .get(&t.database)
            .map_or(false, |db| db.contains_key(&t.table)))
    }

    fn create_table(&self, t: &TableRef) -> StoreResult<()> {
        let mut databases = self.write()?;
        let db = databases
            .get_mut(&t.database)
            .ok_or_else(|| StoreError::DatabaseNotFound(t.database.clone()))?;
        if db.contains_key(&t.table) {
            return Err(StoreError::AlreadyExists(t.to_string()));
        }
        db.insert(t.table.clone(), Table::new());
        Ok(())
    }

    fn scan(&self, t: &TableRef) -> StoreResult<Vec<Document>> {
        let databases = self.read()?;
        Ok(table(&databases, t)?.values().cloned().collect())
    }

    fn get(&self, t: &TableRef, id: &str) -> StoreResult<Option<Document>> {
        let databases = self.read()?;
        Ok(table(&databases, t)?.get(id).cloned())
    }

    fn insert(&self, t: &TableRef, mut document: Document) -> StoreResult<WriteResult> {
        let (id, generated) = prepare_insert(&mut document)?;

        let mut databases = self.write()?;
        let docs = table_mut(&mut databases, t)?;
        if docs.contains_key(&id) {
            return Err(StoreError::DuplicateKey(id));
        }
        docs.insert(id.clone(), document);

        Ok(WriteResult::inserted(generated.then_some(id)))
    }

    fn update(&self, t: &TableRef, id: &str, patch: Document) -> StoreResult<WriteResult> {
        let mut databases = self.write()?;
        let docs = table_mut(&mut databases, t)?;

        let Some(existing) = docs.get(id) else {
            return Ok(WriteResult::default());
        };

        match merge_patch(id, existing, patch)? {
            Some(merged) => {
                docs.insert(id.to_string(), merged);
                Ok(WriteResult::replaced())
            }
            None => Ok(WriteResult::unchanged()),
        }
    }

    fn delete(&self, t: &TableRef, id: &str) -> StoreResult<WriteResult> {
        let mut databases = self.write()?;
        let docs = table_mut(&mut databases, t)?;
        Ok(match docs.remove(id) {
            Some(_) => WriteResult::deleted(),
            None => WriteResult::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn provisioned() -> (MemoryBackend, TableRef) {
        let backend = MemoryBackend::new();
        let t = TableRef::new("shop", "bicycles");
        backend.create_database(&t.database).unwrap();
        backend.create_table(&t).unwrap();
        (backend, t)
    }

    #[test]
    fn test_provisioning_state() {
        let backend = MemoryBackend::new();
        let t = TableRef::new("shop", "bicycles");

        assert!(!backend.database_exists("shop").unwrap());
        assert!(matches!(
            backend.create_table(&t),
            Err(StoreError::DatabaseNotFound(_))
        ));

        backend.create_database("shop").unwrap();
        assert!(backend.database_exists("shop").unwrap());
        assert!(!backend.table_exists(&t).unwrap());

        backend.create_table(&t).unwrap();
        assert!(backend.table_exists(&t).unwrap());
        assert!(matches!(
            backend.create_database("shop"),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_unprovisioned_table_errors() {
        let backend = MemoryBackend::new();
        let t = TableRef::new("shop", "bicycles");
        assert!(matches!(backend.scan(&t), Err(StoreError::DatabaseNotFound(_))));

        backend.create_database("shop").unwrap();
        assert!(matches!(
            backend.get(&t, "x"),
            Err(StoreError::TableNotFound { .. })
        ));
    }

    #[test]
    fn test_insert_generates_key() {
        let (backend, t) = provisioned();
        let result = backend.insert(&t, doc(json!({"brand": "Trek"}))).unwrap();
        assert_eq!(result.inserted, 1);
        assert_eq!(result.generated_keys.len(), 1);

        let stored = backend.get(&t, &result.generated_keys[0]).unwrap().unwrap();
        assert_eq!(stored["brand"], "Trek");
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let (backend, t) = provisioned();
        let result = backend.insert(&t, doc(json!({"id": "b1"}))).unwrap();
        assert!(result.generated_keys.is_empty());
        assert!(matches!(
            backend.insert(&t, doc(json!({"id": "b1"}))),
            Err(StoreError::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_update_and_delete_counters() {
        let (backend, t) = provisioned();
        backend
            .insert(&t, doc(json!({"id": "b1", "brand": "Trek"})))
            .unwrap();

        assert_eq!(
            backend.update(&t, "b1", doc(json!({"brand": "Giant"}))).unwrap(),
            WriteResult::replaced()
        );
        assert_eq!(
            backend.update(&t, "b1", doc(json!({"brand": "Giant"}))).unwrap(),
            WriteResult::unchanged()
        );
        assert_eq!(
            backend.update(&t, "missing", doc(json!({"brand": "Giant"}))).unwrap(),
            WriteResult::default()
        );

        assert_eq!(backend.delete(&t, "b1").unwrap(), WriteResult::deleted());
        assert_eq!(backend.delete(&t, "b1").unwrap(), WriteResult::default());
        assert!(backend.scan(&t).unwrap().is_empty());
    }
}
