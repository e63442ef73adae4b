//! Schema validation for incoming bicycle payloads
//!
//! The schema is declared outside the code (a YAML file) and loaded once at
//! startup. Writes are validated against it before they reach the store:
//! creates in full mode, updates in partial mode.

mod errors;
mod loader;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{FieldDef, FieldType, NestedRules, Pattern, Schema, UnknownFieldPolicy, PRIMARY_KEY};
pub use validator::{SchemaValidator, ValidationMode, ValidationReport};
