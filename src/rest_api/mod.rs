//! # Bicycle REST API
//!
//! HTTP endpoints for CRUD operations on the bicycle collection.
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | GET | /bicycles | 200 + array |
//! | GET | /bicycles/:id | 200 + object, 404 |
//! | POST | /bicycles | 201, 400 |
//! | PUT | /bicycles/:id | 200, 400, 404 |
//! | DELETE | /bicycles/:id | 200, 404 |

pub mod errors;
pub mod handlers;
pub mod response;
pub mod server;

pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::{AppState, BicycleServer};
