use axum::{extract::State, Json};

use crate::auth::Session;
use crate::stats::{aggregate, item_stats, ItemStats, Stats};
use crate::AppState;

/// Aggregate totals over the whole record sequence.
pub async fn get_stats(State(state): State<AppState>, _session: Session) -> Json<Stats> {
    let store = state.store.lock().await;
    Json(aggregate(store.records()))
}

/// Per-item breakdown; only columns that have actually yielded anything.
pub async fn get_item_stats(
    State(state): State<AppState>,
    _session: Session,
) -> Json<Vec<ItemStats>> {
    let store = state.store.lock().await;
    Json(item_stats(store.records()))
}
