//! bicycle-api - a schema-validated CRUD service for a bicycle inventory
//!
//! - `schema`: declarative field rules and the payload validator
//! - `storage`: document backends and the bicycle resource store
//! - `rest_api`: axum routes over the store
//! - `cli`: configuration and the `serve` / `provision` / `validate` commands

pub mod cli;
pub mod observability;
pub mod rest_api;
pub mod schema;
pub mod storage;
