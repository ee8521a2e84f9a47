use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Session;
use crate::constants::ERR_CONFIRM_REQUIRED;
use crate::error::{AppError, Result};
use crate::store::HackRecord;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddRecordRequest {
    #[serde(rename = "hackCount", default = "default_hack_count")]
    pub hack_count: u32,
    /// Item quantities keyed by column name; unknown keys are ignored.
    #[serde(flatten)]
    pub items: BTreeMap<String, u64>,
}

fn default_hack_count() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    /// Clearing is irreversible; the flag replaces the console confirmation
    /// prompt of an interactive tool.
    #[serde(default)]
    pub confirm: bool,
}

/// Return the full record sequence.
pub async fn list_records(
    State(state): State<AppState>,
    _session: Session,
) -> Json<Vec<HackRecord>> {
    let store = state.store.lock().await;
    Json(store.records().to_vec())
}

/// Add one record; the server assigns the timestamp.
pub async fn add_record(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<AddRecordRequest>,
) -> Result<Json<Value>> {
    let record = HackRecord::new(payload.hack_count, &payload.items);

    let mut store = state.store.lock().await;
    store.append(record.clone());
    tracing::info!(
        "User {} added a record ({} hacks, {} items)",
        session.username,
        record.hack_count(),
        record.total_items()
    );

    Ok(Json(json!({ "status": "success", "record": record })))
}

/// Clear all records. Requires an explicit `confirm: true` in the body.
pub async fn clear_records(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<ClearRequest>,
) -> Result<Json<Value>> {
    if !payload.confirm {
        return Err(AppError::InvalidInput(ERR_CONFIRM_REQUIRED.to_string()));
    }

    let mut store = state.store.lock().await;
    let removed = store.len();
    store.clear();
    tracing::info!("User {} cleared {} records", session.username, removed);

    Ok(Json(json!({ "status": "success", "removed": removed })))
}
