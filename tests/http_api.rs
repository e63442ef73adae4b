//! HTTP API Tests
//!
//! Drives the router in-process, one request at a time, against an
//! in-memory store and the shipped bicycle schema.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bicycle_api::rest_api::{AppState, BicycleServer};
use bicycle_api::schema::SchemaLoader;
use bicycle_api::storage::{BicycleStore, MemoryBackend, TableRef};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

// =============================================================================
// Test Utilities
// =============================================================================

fn build_app(provisioned: bool) -> Router {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/schemas/bicycles.yml");
    let schema = SchemaLoader::new(path, "bicycle_schema").load().unwrap();

    let store = BicycleStore::new(
        Arc::new(MemoryBackend::new()),
        TableRef::new("bicycle_shop", "bicycles"),
    );
    if provisioned {
        store.provision().unwrap();
    }

    BicycleServer::new(AppState::new(store, schema)).router()
}

fn test_app() -> Router {
    build_app(true)
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: Body,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    let resp = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    match body {
        Some(body) => {
            send_raw(
                app,
                method,
                uri,
                Some("application/json"),
                Body::from(body.to_string()),
            )
            .await
        }
        None => send_raw(app, method, uri, None, Body::empty()).await,
    }
}

async fn create(app: &Router, body: Value) -> String {
    let (status, resp) = send(app, Method::POST, "/bicycles", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", resp);
    resp["bicycle_id"].as_str().unwrap().to_string()
}

// =============================================================================
// Create & Read
// =============================================================================

#[tokio::test]
async fn test_create_then_get() {
    let app = test_app();

    let (status, resp) = send(
        &app,
        Method::POST,
        "/bicycles",
        Some(json!({"brand": "Trek", "model": "X1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["message"], "Bicycle created");
    let id = resp["bicycle_id"].as_str().unwrap().to_string();

    let (status, bicycle) = send(&app, Method::GET, &format!("/bicycles/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bicycle["id"], id.as_str());
    assert_eq!(bicycle["brand"], "Trek");
    assert_eq!(bicycle["model"], "X1");
}

#[tokio::test]
async fn test_list_returns_array() {
    let app = test_app();

    let (status, list) = send(&app, Method::GET, "/bicycles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));

    create(&app, json!({"brand": "Trek", "model": "X1"})).await;
    create(&app, json!({"brand": "Giant", "model": "TCR"})).await;

    let (status, list) = send(&app, Method::GET, "/bicycles", None).await;
    assert_eq!(status, StatusCode::OK);
    let mut brands: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["brand"].as_str().unwrap())
        .collect();
    brands.sort_unstable();
    assert_eq!(brands, vec!["Giant", "Trek"]);
}

#[tokio::test]
async fn test_get_unknown_is_404() {
    let app = test_app();
    let (status, resp) = send(&app, Method::GET, "/bicycles/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp, json!({"error": "Bicycle not found"}));
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_create_is_400_and_stores_nothing() {
    let app = test_app();

    let (status, resp) = send(
        &app,
        Method::POST,
        "/bicycles",
        Some(json!({"model": "X1", "year": "old"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp,
        json!({
            "error": "Invalid data",
            "details": {
                "brand": ["required field"],
                "year": ["must be of integer type"]
            }
        })
    );

    let (_, list) = send(&app, Method::GET, "/bicycles", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_unknown_field_rejected() {
    let app = test_app();
    let (status, resp) = send(
        &app,
        Method::POST,
        "/bicycles",
        Some(json!({"brand": "Trek", "model": "X1", "wheels": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["details"]["wheels"], json!(["unknown field"]));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = test_app();
    let (status, resp) = send_raw(
        &app,
        Method::POST,
        "/bicycles",
        Some("application/json"),
        Body::from("{\"brand\": "),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"], "Invalid data");
    assert!(resp["details"]["body"].is_array());
}

#[tokio::test]
async fn test_missing_content_type_is_400() {
    let app = test_app();
    let (status, resp) = send_raw(
        &app,
        Method::POST,
        "/bicycles",
        None,
        Body::from(r#"{"brand": "Trek", "model": "X1"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["details"]["body"].is_array());
}

#[tokio::test]
async fn test_non_object_body_is_400() {
    let app = test_app();
    let (status, resp) = send(&app, Method::POST, "/bicycles", Some(json!(["Trek"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["details"]["$root"], json!(["must be of dict type"]));
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let app = test_app();
    let id = create(&app, json!({"brand": "Trek", "model": "X1"})).await;
    let uri = format!("/bicycles/{}", id);

    let (status, resp) = send(&app, Method::PUT, &uri, Some(json!({"model": "X2"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({"message": "Bicycle updated"}));

    let (_, bicycle) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(bicycle["brand"], "Trek");
    assert_eq!(bicycle["model"], "X2");
}

#[tokio::test]
async fn test_noop_update_is_200() {
    let app = test_app();
    let id = create(&app, json!({"brand": "Trek", "model": "X1"})).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/bicycles/{}", id),
        Some(json!({"model": "X1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_unknown_is_404_without_upsert() {
    let app = test_app();

    let (status, resp) = send(
        &app,
        Method::PUT,
        "/bicycles/ghost",
        Some(json!({"model": "X2"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp, json!({"error": "Bicycle not found"}));

    let (status, _) = send(&app, Method::GET, "/bicycles/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_update_is_400_and_changes_nothing() {
    let app = test_app();
    let id = create(&app, json!({"brand": "Trek", "model": "X1"})).await;
    let uri = format!("/bicycles/{}", id);

    let (status, resp) = send(&app, Method::PUT, &uri, Some(json!({"price": -5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["details"]["price"], json!(["min value is 0"]));

    let (status, resp) = send(&app, Method::PUT, &uri, Some(json!({"id": "other"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["details"]["id"], json!(["field is read-only"]));

    let (_, bicycle) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(bicycle["id"], id.as_str());
    assert!(bicycle.get("price").is_none());
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_then_get_is_404() {
    let app = test_app();
    let id = create(&app, json!({"brand": "Trek", "model": "X1"})).await;
    let uri = format!("/bicycles/{}", id);

    let (status, resp) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({"message": "Bicycle deleted"}));

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Health & Store Failure
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, resp) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_store_failure_is_500_without_details() {
    let app = build_app(false);
    let (status, resp) = send(&app, Method::GET, "/bicycles", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp, json!({"error": "Internal server error"}));
}
