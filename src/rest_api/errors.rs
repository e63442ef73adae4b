//! # REST API Errors
//!
//! Error kinds surfaced by the handlers and their HTTP mapping:
//! - invalid payload → 400 with the validation report as `details`
//! - unknown id → 404
//! - storage failure → 500, logged, no details leaked

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::schema::ValidationReport;
use crate::storage::StoreError;

/// Result type for REST operations
pub type ApiResult<T> = Result<T, ApiError>;

/// REST API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Payload failed schema validation or could not be parsed
    #[error("Invalid data")]
    Validation(ValidationReport),

    /// No bicycle with the requested id
    #[error("Bicycle not found")]
    NotFound,

    /// Document store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationReport>,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(report) => Self {
                error: "Invalid data".to_string(),
                details: Some(report),
            },
            ApiError::NotFound => Self {
                error: "Bicycle not found".to_string(),
                details: None,
            },
            ApiError::Store(_) => Self {
                error: "Internal server error".to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let ApiError::Store(ref e) = self {
            tracing::error!(error = %e, fatal = e.is_fatal(), "store operation failed");
        }
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
