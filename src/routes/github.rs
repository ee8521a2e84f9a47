use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Session;
use crate::constants::DEFAULT_REMOTE_FILENAME;
use crate::error::{AppError, Result};
use crate::github::GithubSyncConfig;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveConfigRequest {
    pub repository: String,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "remoteFilename")]
    pub remote_filename: Option<String>,
}

/// Return the current sync settings, as persisted.
pub async fn get_github_config(
    State(state): State<AppState>,
    _session: Session,
) -> Json<GithubSyncConfig> {
    let config = state.github_config.lock().await;
    Json(config.config().clone())
}

/// Save sync settings. Repository and token are required; the remote
/// filename defaults when omitted.
pub async fn save_github_config(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<SaveConfigRequest>,
) -> Result<Json<Value>> {
    if payload.repository.trim().is_empty() || payload.access_token.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "repository and accessToken are required".to_string(),
        ));
    }

    let remote_filename = payload
        .remote_filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REMOTE_FILENAME.to_string());

    let config = GithubSyncConfig {
        repository: Some(payload.repository),
        access_token: Some(payload.access_token),
        remote_filename: Some(remote_filename),
    };

    let mut store = state.github_config.lock().await;
    store.save(config)?;
    tracing::info!("User {} updated the sync settings", session.username);

    Ok(Json(json!({ "status": "success" })))
}

/// Pull the remote CSV and merge unseen records into the store.
pub async fn sync_from_github(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Value>> {
    let config = state.github_config.lock().await.config().clone();

    let mut store = state.store.lock().await;
    let inserted = state.github.pull(&config, &mut store).await?;
    tracing::info!(
        "User {} synced from GitHub: {} new records",
        session.username,
        inserted
    );

    Ok(Json(json!({
        "status": "success",
        "inserted": inserted,
        "data": store.records(),
    })))
}

/// Upload the full record set, replacing the remote file.
pub async fn upload_to_github(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Value>> {
    let config = state.github_config.lock().await.config().clone();

    let store = state.store.lock().await;
    state.github.push(&config, &store).await?;
    tracing::info!(
        "User {} uploaded {} records to GitHub",
        session.username,
        store.len()
    );

    Ok(Json(json!({ "status": "success" })))
}
