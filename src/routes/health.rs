use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
///
/// Reports the server version and how many records are loaded. Used by
/// monitoring; requires no session.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.lock().await;
    Json(json!({
        "status": "healthy",
        "records": store.len(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
