//! # Bicycle Route Handlers
//!
//! Each handler is stateless: it validates the payload (write paths only),
//! makes a single store call and maps the outcome to a status and body.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::debug;

use crate::schema::{SchemaValidator, ValidationMode, ValidationReport};
use crate::storage::{Bicycle, Document};

use super::errors::{ApiError, ApiResult};
use super::response::{CreatedResponse, HealthResponse, MessageResponse};
use super::server::AppState;

/// Unwraps the JSON body, turning parse failures into a validation error.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let mut report = ValidationReport::default();
            report.push("body", rejection.body_text());
            Err(ApiError::Validation(report))
        }
    }
}

/// Converts a validated payload into a document.
fn into_document(payload: Value) -> ApiResult<Document> {
    match payload {
        Value::Object(document) => Ok(document),
        _ => {
            let mut report = ValidationReport::default();
            report.push("$root", "must be of dict type");
            Err(ApiError::Validation(report))
        }
    }
}

/// GET /bicycles
pub async fn list_bicycles(State(state): State<AppState>) -> ApiResult<Json<Vec<Bicycle>>> {
    let bicycles = state.store.list_all()?;
    Ok(Json(bicycles))
}

/// GET /bicycles/:id
pub async fn get_bicycle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Bicycle>> {
    state.store.get(&id)?.map(Json).ok_or(ApiError::NotFound)
}

/// POST /bicycles
pub async fn create_bicycle(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let payload = json_body(body)?;

    SchemaValidator::new(&state.schema)
        .validate(&payload, ValidationMode::Full)
        .into_result()
        .map_err(ApiError::Validation)?;

    let id = state.store.create(into_document(payload)?)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(id))))
}

/// PUT /bicycles/:id
pub async fn update_bicycle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let payload = json_body(body)?;

    SchemaValidator::new(&state.schema)
        .validate_update(&id, &payload)
        .into_result()
        .map_err(ApiError::Validation)?;

    let matched = state.store.update(&id, into_document(payload)?)?;
    if matched == 0 {
        debug!(id = %id, "update matched nothing");
        return Err(ApiError::NotFound);
    }
    Ok(Json(MessageResponse::updated()))
}

/// DELETE /bicycles/:id
pub async fn delete_bicycle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    if state.store.delete(&id)? == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(MessageResponse::deleted()))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
