//! GitHub sync tests against a local mock of the contents API.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hacktrack_server::error::AppError;
use hacktrack_server::github::{GithubClient, GithubSyncConfig};
use hacktrack_server::store::{HackRecord, RecordStore};

const CONTENTS_PATH: &str = "/repos/user/repo/contents/data.csv";

fn sync_config() -> GithubSyncConfig {
    GithubSyncConfig {
        repository: Some("user/repo".to_string()),
        access_token: Some("test-token".to_string()),
        remote_filename: Some("data.csv".to_string()),
    }
}

fn client(server: &MockServer) -> GithubClient {
    GithubClient::new(server.uri(), Duration::from_secs(5)).expect("client builds")
}

fn store(dir: &TempDir) -> RecordStore {
    RecordStore::load(dir.path().join("hack_data.json"))
}

/// Base64 content the way the API serves it: wrapped with newlines.
fn wrapped_base64(text: &str) -> String {
    BASE64
        .encode(text)
        .as_bytes()
        .chunks(60)
        .map(|chunk| std::str::from_utf8(chunk).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn test_pull_missing_remote_file_inserts_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);
    let inserted = client(&server)
        .pull(&sync_config(), &mut store)
        .await
        .unwrap();

    assert_eq!(inserted, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_pull_merges_unseen_records() {
    let csv = "timestamp,hackCount,L7Res\n\
               2024-01-01T00:00:00,1,1\n\
               2024-01-02T00:00:00,2,3\n";
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(header("Authorization", "token test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": wrapped_base64(csv),
            "sha": "abc123",
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);
    let client = client(&server);

    let inserted = client.pull(&sync_config(), &mut store).await.unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(store.records()[1].item("L7Res"), 3);

    // Pulling again inserts nothing: every timestamp is already known.
    let inserted = client.pull(&sync_config(), &mut store).await.unwrap();
    assert_eq!(inserted, 0);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_pull_requires_complete_config() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);

    let config = GithubSyncConfig {
        repository: Some("user/repo".to_string()),
        ..Default::default()
    };
    let result = client(&server).pull(&config, &mut store).await;
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_pull_unexpected_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);
    let result = client(&server).pull(&sync_config(), &mut store).await;

    assert!(matches!(result, Err(AppError::Transport(_))));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_push_includes_sha_when_file_exists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": wrapped_base64("timestamp,hackCount\n2023-01-01T00:00:00,1\n"),
            "sha": "existing-sha",
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({ "sha": "existing-sha" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);
    store.append(HackRecord {
        timestamp: "2024-01-01T00:00:00".to_string(),
        hack_count: Some(1),
        items: Default::default(),
    });

    client(&server).push(&sync_config(), &store).await.unwrap();
}

#[tokio::test]
async fn test_push_creates_missing_file_without_sha() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);
    store.append(HackRecord {
        timestamp: "2024-01-01T00:00:00".to_string(),
        hack_count: Some(1),
        items: Default::default(),
    });

    client(&server).push(&sync_config(), &store).await.unwrap();

    // The upload body must carry the base64 record set and no sha.
    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
    assert!(body.get("sha").is_none());
    assert!(body["message"].as_str().unwrap().starts_with("Update hack data"));

    let uploaded = BASE64.decode(body["content"].as_str().unwrap()).unwrap();
    let uploaded = String::from_utf8(uploaded).unwrap();
    assert!(uploaded.starts_with("timestamp,hackCount,"));
    assert!(uploaded.contains("2024-01-01T00:00:00,1,"));
}

#[tokio::test]
async fn test_push_empty_store_makes_no_network_call() {
    let server = MockServer::start().await;
    // No mocks mounted: any request would fail the test via a 404 from
    // wiremock plus the received-request assertion below.

    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let result = client(&server).push(&sync_config(), &store).await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_push_failure_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = store(&dir);
    store.append(HackRecord {
        timestamp: "2024-01-01T00:00:00".to_string(),
        hack_count: Some(1),
        items: Default::default(),
    });

    let result = client(&server).push(&sync_config(), &store).await;
    assert!(matches!(result, Err(AppError::Transport(_))));
}
