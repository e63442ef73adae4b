//! Durable file-backed document backend
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/<database>/            one directory per database
//! <data_dir>/<database>/<table>.log append-only record log per table
//! ```
//!
//! Every write appends one checksummed record and calls `sync_data` before
//! the in-memory image is updated, so an acknowledged write is on disk.
//! A table is replayed into memory the first time it is touched. Replay
//! halts on the first corrupt record; it never skips one.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, error, info, warn};

use super::backend::{merge_patch, prepare_insert, Document, DocumentBackend, TableRef, WriteResult};
use super::errors::{StoreError, StoreResult};
use super::record::LogRecord;

const TABLE_EXTENSION: &str = "log";

/// A replayed table: the live documents plus the append handle.
struct TableLog {
    path: PathBuf,
    file: File,
    documents: HashMap<String, Document>,
    /// Set when a failed append could not be cut back off the log.
    poisoned: bool,
}

impl TableLog {
    fn open(path: PathBuf) -> StoreResult<Self> {
        let bytes = fs::read(&path)
            .map_err(|e| StoreError::io(format!("reading {}", path.display()), e))?;
        let documents = replay(&path, &bytes)?;

        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(format!("opening {}", path.display()), e))?;

        debug!(path = %path.display(), documents = documents.len(), "table replayed");

        Ok(Self {
            path,
            file,
            documents,
            poisoned: false,
        })
    }

    /// Appends a record and fsyncs it, then applies it to the live image.
    ///
    /// A failed write or sync truncates the log back to where the record
    /// started, so the next append begins on a clean line.
    fn append(&mut self, record: LogRecord) -> StoreResult<()> {
        if self.poisoned {
            return Err(StoreError::Unavailable(format!(
                "{} has an unrecoverable partial record",
                self.path.display()
            )));
        }

        let line = record.encode()?;
        let offset = self
            .file
            .metadata()
            .map_err(|e| StoreError::io(format!("inspecting {}", self.path.display()), e))?
            .len();

        if let Err(e) = write_synced(&mut self.file, line.as_bytes()) {
            self.rollback(offset);
            return Err(StoreError::io(format!("appending to {}", self.path.display()), e));
        }

        match record {
            LogRecord::Put { id, doc } => {
                self.documents.insert(id, doc);
            }
            LogRecord::Delete { id } => {
                self.documents.remove(&id);
            }
        }
        Ok(())
    }

    /// Cuts the log back to `offset`, discarding a partially written record.
    fn rollback(&mut self, offset: u64) {
        match self.file.set_len(offset).and_then(|()| self.file.sync_data()) {
            Ok(()) => warn!(path = %self.path.display(), offset, "failed append rolled back"),
            Err(e) => {
                error!(path = %self.path.display(), offset, error = %e, "rollback failed, table is read-only");
                self.poisoned = true;
            }
        }
    }
}

fn write_synced(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes)?;
    file.sync_data()
}

/// Rebuilds the live document set from a table log. Latest record wins.
fn replay(path: &Path, bytes: &[u8]) -> StoreResult<HashMap<String, Document>> {
    let mut documents = HashMap::new();
    if bytes.is_empty() {
        return Ok(documents);
    }

    let corruption = |line: usize, reason: String| StoreError::Corruption {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut segments: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    // A complete log ends with a newline, leaving one empty trailing segment.
    match segments.pop() {
        Some(tail) if !tail.is_empty() => {
            return Err(corruption(segments.len() + 1, "truncated record".to_string()));
        }
        _ => {}
    }

    for (index, segment) in segments.iter().enumerate() {
        let line_no = index + 1;
        let line = std::str::from_utf8(segment)
            .map_err(|_| corruption(line_no, "record is not valid UTF-8".to_string()))?;
        match LogRecord::decode(line).map_err(|reason| corruption(line_no, reason))? {
            LogRecord::Put { id, doc } => {
                documents.insert(id, doc);
            }
            LogRecord::Delete { id } => {
                documents.remove(&id);
            }
        }
    }

    Ok(documents)
}

/// Backend persisting each table as an append-only log on local disk
pub struct FileBackend {
    root: PathBuf,
    tables: RwLock<HashMap<TableRef, TableLog>>,
}

impl FileBackend {
    /// Opens a backend rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = data_dir.into();
        fs::create_dir_all(&root)
            .map_err(|e| StoreError::io(format!("creating {}", root.display()), e))?;
        info!(data_dir = %root.display(), "file backend opened");
        Ok(Self {
            root,
            tables: RwLock::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn database_path(&self, database: &str) -> PathBuf {
        self.root.join(database)
    }

    /// Path of a table's log file.
    pub fn table_path(&self, t: &TableRef) -> PathBuf {
        self.database_path(&t.database)
            .join(format!("{}.{}", t.table, TABLE_EXTENSION))
    }

    fn check_table(&self, t: &TableRef) -> StoreResult<PathBuf> {
        if !self.database_path(&t.database).is_dir() {
            return Err(StoreError::DatabaseNotFound(t.database.clone()));
        }
        let path = self.table_path(t);
        if !path.is_file() {
            return Err(StoreError::table_not_found(&t.database, &t.table));
        }
        Ok(path)
    }

    /// Runs `f` against a loaded table, replaying it first if needed.
    fn with_table<R>(
        &self,
        t: &TableRef,
        f: impl FnOnce(&mut TableLog) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if !tables.contains_key(t) {
            let path = self.check_table(t)?;
            tables.insert(t.clone(), TableLog::open(path)?);
        }

        match tables.get_mut(t) {
            Some(log) => f(log),
            None => Err(StoreError::table_not_found(&t.database, &t.table)),
        }
    }

    /// Read-only access; falls back to the loading path on first touch.
    fn read_table<R>(&self, t: &TableRef, f: impl FnOnce(&TableLog) -> R) -> StoreResult<R> {
        {
            let tables = self
                .tables
                .read()
                .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
            if let Some(log) = tables.get(t) {
                return Ok(f(log));
            }
        }
        self.with_table(t, |log| Ok(f(log)))
    }
}

impl DocumentBackend for FileBackend {
    fn database_exists(&self, database: &str) -> StoreResult<bool> {
        Ok(self.database_path(database).is_dir())
    }

    fn create_database(&self, database: &str) -> StoreResult<()> {
        let path = self.database_path(database);
        match fs::create_dir(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(database.to_string()))
            }
            Err(e) => Err(StoreError::io(format!("creating {}", path.display()), e)),
        }
    }

    fn table_exists(&self, t: &TableRef) -> StoreResult<bool> {
        Ok(self.table_path(t).is_file())
    }

    fn create_table(&self, t: &TableRef) -> StoreResult<()> {
        if !self.database_exists(&t.database)? {
            return Err(StoreError::DatabaseNotFound(t.database.clone()));
        }
        let path = self.table_path(t);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file
                .sync_all()
                .map_err(|e| StoreError::io(format!("syncing {}", path.display()), e)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(t.to_string()))
            }
            Err(e) => Err(StoreError::io(format!("creating {}", path.display()), e)),
        }
    }

    fn scan(&self, t: &TableRef) -> StoreResult<Vec<Document>> {
        self.read_table(t, |log| log.documents.values().cloned().collect())
    }

    fn get(&self, t: &TableRef, id: &str) -> StoreResult<Option<Document>> {
        self.read_table(t, |log| log.documents.get(id).cloned())
    }

    fn insert(&self, t: &TableRef, mut document: Document) -> StoreResult<WriteResult> {
        let (id, generated) = prepare_insert(&mut document)?;

        self.with_table(t, |log| {
            if log.documents.contains_key(&id) {
                return Err(StoreError::DuplicateKey(id));
            }
            log.append(LogRecord::Put {
                id: id.clone(),
                doc: document,
            })?;
            Ok(WriteResult::inserted(generated.then_some(id)))
        })
    }

    fn update(&self, t: &TableRef, id: &str, patch: Document) -> StoreResult<WriteResult> {
        self.with_table(t, |log| {
            let Some(existing) = log.documents.get(id) else {
                return Ok(WriteResult::default());
            };

            match merge_patch(id, existing, patch)? {
                Some(merged) => {
                    log.append(LogRecord::Put {
                        id: id.to_string(),
                        doc: merged,
                    })?;
                    Ok(WriteResult::replaced())
                }
                None => Ok(WriteResult::unchanged()),
            }
        })
    }

    fn delete(&self, t: &TableRef, id: &str) -> StoreResult<WriteResult> {
        self.with_table(t, |log| {
            if !log.documents.contains_key(id) {
                return Ok(WriteResult::default());
            }
            log.append(LogRecord::Delete { id: id.to_string() })?;
            Ok(WriteResult::deleted())
        })
    }
}
