//! Demo application handler.
//!
//! The multiplexer treats the application as an opaque `axum::Router`; the
//! surrounding product (the to-do service) mounts its real routes in place of
//! this one. What matters here is the seam: the same router is served over
//! plaintext in HTTP mode and over TLS in HTTPS mode.

use std::time::Duration;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(health))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
}

async fn index() -> &'static str {
    "dualport front end\n"
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
