//! Hack-tracking web backend.
//!
//! Logs game-item acquisition events ("hacks") with their item breakdown,
//! behind a session-cookie login. The record sequence lives in memory and is
//! persisted to a flat JSON file; it can be imported/exported as CSV and
//! synchronized with a CSV file hosted in a GitHub repository.

pub mod auth;
pub mod config;
pub mod constants;
pub mod csv;
pub mod error;
pub mod github;
pub mod routes;
pub mod stats;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;

use auth::CredentialVerifier;
use github::{GithubClient, GithubConfigStore};
use store::RecordStore;

/// Application state shared across all handlers.
///
/// The record store and sync config sit behind a single async mutex each:
/// one process, one writer at a time. The credential verifier is injected so
/// the strategy is swappable without touching handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<RecordStore>>,
    pub github_config: Arc<Mutex<GithubConfigStore>>,
    pub github: Arc<GithubClient>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        store: RecordStore,
        github_config: GithubConfigStore,
        github: GithubClient,
        verifier: Arc<dyn CredentialVerifier>,
        config: Config,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            github_config: Arc::new(Mutex::new(github_config)),
            github: Arc::new(github),
            verifier,
            config,
        }
    }
}

/// Build the application router. Split out of `main` so integration tests
/// can drive the exact production routing.
pub fn build_router(state: AppState) -> Router {
    use routes::*;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/auth/status", get(auth_status))
        .route(
            "/api/data",
            get(list_records).post(add_record).delete(clear_records),
        )
        .route("/api/stats", get(get_stats))
        .route("/api/stats/items", get(get_item_stats))
        .route(
            "/api/github/config",
            get(get_github_config).post(save_github_config),
        )
        .route("/api/github/sync", post(sync_from_github))
        .route("/api/github/upload", post(upload_to_github))
        .route("/api/export/csv", get(export_csv))
        .route("/api/import/csv", post(import_csv))
        .with_state(state)
}
