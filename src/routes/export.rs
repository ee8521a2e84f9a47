use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::{json, Value};

use crate::auth::Session;
use crate::constants::RECOVERY_FILE;
use crate::csv;
use crate::error::{AppError, Result};
use crate::AppState;

/// Export the full record set as CSV text with a timestamped filename.
pub async fn export_csv(State(state): State<AppState>, _session: Session) -> Json<Value> {
    let store = state.store.lock().await;
    let filename = format!(
        "ingress_hack_data_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    Json(json!({
        "filename": filename,
        "content": csv::encode(store.records()),
    }))
}

/// Import CSV data from a multipart upload: either a `file` part (raw bytes,
/// encoding detected) or a `content`/`csv` text part. Returns how many
/// records were actually inserted; re-imports of already-seen timestamps
/// count as zero.
pub async fn import_csv(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut text = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let raw = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                let (decoded, legacy_encoding) = csv::decode_bytes(&raw)?;
                if legacy_encoding {
                    // Keep a UTF-8 copy of the converted upload around so the
                    // user can re-download it in a sane encoding.
                    if let Err(e) = std::fs::write(RECOVERY_FILE, &decoded) {
                        tracing::warn!("Failed to write {}: {}", RECOVERY_FILE, e);
                    }
                }
                text = Some(decoded);
            }
            Some("content") | Some("csv") => {
                text = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::InvalidInput(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let text = text.ok_or_else(|| {
        AppError::InvalidInput("Upload must contain a 'file' or 'content' part".to_string())
    })?;

    let records = csv::decode(&text)?;
    let mut store = state.store.lock().await;
    let inserted = store.merge(records);
    tracing::info!(
        "User {} imported a CSV: {} new records",
        session.username,
        inserted
    );

    Ok(Json(json!({ "status": "success", "inserted": inserted })))
}
