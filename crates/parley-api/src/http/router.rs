//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/` except `/health`.
//! Middleware: CORS, tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use parley_core::dispatch::Dispatcher;
use parley_core::storage::kv_store::KvStore;

use crate::http::handlers;

/// Router state: the dispatcher shared by every request.
pub struct HttpState<S: KvStore> {
    pub dispatcher: Arc<Dispatcher<S>>,
}

impl<S: KvStore> Clone for HttpState<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

/// Build the complete API router with all routes and middleware.
pub fn build_router<S: KvStore + 'static>(dispatcher: Arc<Dispatcher<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new().route("/messages", post(handlers::message::post_message::<S>));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(HttpState { dispatcher })
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
