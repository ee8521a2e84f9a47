//! Synchronization of the record set with a single CSV file hosted in a
//! GitHub repository, via the contents API.
//!
//! The model is replace-whole-file: `push` serializes the entire current
//! record set and overwrites the remote file (conditionally, using the sha
//! the API hands back); `pull` fetches the remote CSV and additively merges
//! unseen timestamps into the local store. There is no retry and no conflict
//! resolution beyond timestamp identity.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::ERR_SYNC_NOT_CONFIGURED;
use crate::csv;
use crate::error::{AppError, Result};
use crate::store::RecordStore;

/// Sync settings, persisted as a local JSON file. A loaded file may be
/// partial; every sync operation requires all three fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GithubSyncConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(
        rename = "accessToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<String>,
    #[serde(
        rename = "remoteFilename",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub remote_filename: Option<String>,
}

impl GithubSyncConfig {
    /// All three settings, or a config error naming what is missing.
    pub fn complete(&self) -> Result<(&str, &str, &str)> {
        match (
            self.repository.as_deref(),
            self.access_token.as_deref(),
            self.remote_filename.as_deref(),
        ) {
            (Some(repo), Some(token), Some(filename)) => Ok((repo, token, filename)),
            _ => Err(AppError::Config(ERR_SYNC_NOT_CONFIGURED.to_string())),
        }
    }
}

/// File-backed holder for the sync settings. Loaded once at startup;
/// overwritten whole on save.
pub struct GithubConfigStore {
    path: PathBuf,
    config: GithubSyncConfig,
}

impl GithubConfigStore {
    /// Load settings from the config file; missing or malformed files yield
    /// an unconfigured state with a warning log, never an error.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed sync config {}: {}", path.display(), e);
                GithubSyncConfig::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => GithubSyncConfig::default(),
            Err(e) => {
                tracing::warn!("Failed to read sync config {}: {}", path.display(), e);
                GithubSyncConfig::default()
            }
        };
        Self { path, config }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &GithubSyncConfig {
        &self.config
    }

    /// Replace and persist the settings. Unlike record persistence, a failed
    /// write here is reported: losing an access token silently would leave
    /// sync broken with no explanation.
    pub fn save(&mut self, config: GithubSyncConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        self.config = config;
        tracing::info!("Saved sync config to {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    /// Base64 file body; the API wraps it with newlines.
    content: String,
    sha: String,
}

/// Remote file state as fetched from the contents API.
#[derive(Debug)]
pub struct RemoteFile {
    pub text: String,
    pub sha: String,
}

/// Thin client for the GitHub contents API.
///
/// The base URL is injectable so tests can point it at a local mock server.
/// All requests carry an explicit timeout; exceeding it surfaces as a
/// transport error like any other failed call.
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubClient {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hacktrack-server/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into(),
        })
    }

    fn contents_url(&self, repository: &str, filename: &str) -> String {
        format!("{}/repos/{}/contents/{}", self.api_base, repository, filename)
    }

    /// Fetch the remote file. `Ok(None)` means the file does not exist yet;
    /// any status other than 200/404 is a transport error.
    pub async fn fetch(&self, config: &GithubSyncConfig) -> Result<Option<RemoteFile>> {
        let (repository, token, filename) = config.complete()?;

        let response = self
            .http
            .get(self.contents_url(repository, filename))
            .header("Authorization", format!("token {token}"))
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: ContentsResponse = response.json().await?;
                // The API base64-wraps the content with embedded newlines.
                let cleaned: String = body
                    .content
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                let bytes = BASE64
                    .decode(cleaned)
                    .map_err(|e| AppError::Transport(format!("Invalid base64 content: {e}")))?;
                let text = String::from_utf8(bytes)
                    .map_err(|e| AppError::Transport(format!("Remote file is not UTF-8: {e}")))?;
                Ok(Some(RemoteFile {
                    text,
                    sha: body.sha,
                }))
            }
            status => Err(AppError::Transport(format!(
                "GitHub fetch returned HTTP {status}"
            ))),
        }
    }

    /// Pull the remote CSV and merge unseen timestamps into the store.
    /// Returns the number of inserted records; a missing remote file counts
    /// as an empty pull, not an error. A failed pull leaves the store at its
    /// pre-merge baseline.
    pub async fn pull(&self, config: &GithubSyncConfig, store: &mut RecordStore) -> Result<usize> {
        let Some(remote) = self.fetch(config).await? else {
            tracing::info!("No remote data file found; nothing to pull");
            return Ok(0);
        };

        let records = csv::decode(&remote.text)?;
        let inserted = store.merge(records);
        tracing::info!("Pulled {} new records from GitHub", inserted);
        Ok(inserted)
    }

    /// Push the full current record set, overwriting the remote file. The
    /// preceding fetch exists only to obtain the sha the API requires for
    /// overwrites; a missing remote file skips it. Local state is never
    /// touched.
    pub async fn push(&self, config: &GithubSyncConfig, store: &RecordStore) -> Result<()> {
        let (repository, token, filename) = config.complete()?;
        if store.is_empty() {
            return Err(AppError::InvalidInput("No records to upload".to_string()));
        }

        let content = BASE64.encode(csv::encode(store.records()));
        let sha = self.fetch(config).await?.map(|remote| remote.sha);

        let mut body = json!({
            "message": format!(
                "Update hack data - {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S")
            ),
            "content": content,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let response = self
            .http
            .put(self.contents_url(repository, filename))
            .header("Authorization", format!("token {token}"))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "GitHub upload returned HTTP {}",
                response.status()
            )));
        }

        tracing::info!("Uploaded {} records to GitHub", store.len());
        Ok(())
    }
}
