//! Liveness route.

use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// GET /health. The engine has no stateful dependencies to probe.
async fn health() -> Json<serde_json::Value> {
    let start = Instant::now();
    let error: Option<String> = None;

    Json(json!({
        "system": {
            "error": error,
            "latency": start.elapsed().as_millis() as u64,
        },
    }))
}
