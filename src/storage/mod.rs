//! Document storage for bicycles
//!
//! The resource store (`BicycleStore`) talks to a `DocumentBackend`, which
//! stands in for the document database: databases hold tables, tables hold
//! JSON documents keyed by `id`.
//!
//! Two backends ship with the service:
//! - `MemoryBackend`: volatile, for tests and throwaway runs
//! - `FileBackend`: append-only, checksummed table logs on local disk
//!
//! # Invariants
//!
//! - Primary keys are unique per table
//! - Updates merge, they never insert
//! - Acknowledged writes on the file backend have been fsynced
//! - A corrupt record halts the table load

mod backend;
mod bicycles;
mod checksum;
mod errors;
mod file;
mod memory;
mod record;

pub use backend::{Document, DocumentBackend, TableRef, WriteResult};
pub use bicycles::{Bicycle, BicycleStore, Provisioned};
pub use checksum::compute_checksum;
pub use errors::{StoreError, StoreResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use record::LogRecord;
