//! # REST API HTTP Server
//!
//! Axum-based HTTP server for the bicycle endpoints.

use std::future::Future;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::observability::{log_event_with_fields, Event};
use crate::schema::Schema;
use crate::storage::BicycleStore;

use super::handlers::{
    create_bicycle, delete_bicycle, get_bicycle, health, list_bicycles, update_bicycle,
};

/// Shared state handed to every handler.
///
/// Built once at startup; cloning is cheap.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: BicycleStore,
    pub schema: Arc<Schema>,
}

impl AppState {
    pub fn new(store: BicycleStore, schema: Schema) -> Self {
        Self {
            store,
            schema: Arc::new(schema),
        }
    }
}

/// HTTP server for the bicycle collection
pub struct BicycleServer {
    state: AppState,
    /// Allowed CORS origins; empty means permissive
    cors_origins: Vec<String>,
}

impl BicycleServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            cors_origins: Vec::new(),
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/bicycles", get(list_bicycles).post(create_bicycle))
            .route(
                "/bicycles/:id",
                get(get_bicycle).put(update_bicycle).delete(delete_bicycle),
            )
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&self.cors_origins))
    }

    /// Binds `addr` (`host:port`, hostnames are resolved) and serves until
    /// `shutdown` resolves, then drains in-flight requests.
    pub async fn serve<F>(self, addr: &str, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?.to_string();
        log_event_with_fields(Event::ServerListening, &[("addr", local.as_str())]);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// No origins configured means permissive.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
