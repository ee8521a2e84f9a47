use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hacktrack_server::auth::StaticCredentials;
use hacktrack_server::github::{GithubClient, GithubConfigStore};
use hacktrack_server::store::RecordStore;
use hacktrack_server::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hacktrack_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting hack tracker server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    // Load persisted state
    let store = RecordStore::load(&config.data_file);
    let github_config = GithubConfigStore::load(&config.github_config_file);
    let github = GithubClient::new(
        config.github_api_base.clone(),
        Duration::from_secs(config.sync_timeout_secs),
    )
    .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;
    let verifier = Arc::new(StaticCredentials::new(config.credentials.clone()));

    // Configure CORS; session cookies require credentialed requests, so the
    // origin list must be explicit.
    let cors = CorsLayer::new()
        .allow_origin(
            config
                .allowed_origins
                .iter()
                .map(|s| s.parse::<axum::http::HeaderValue>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| anyhow::anyhow!("Invalid ALLOWED_ORIGINS entry: {e}"))?,
        )
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true);

    // Create app state
    let state = AppState::new(store, github_config, github, verifier, config.clone());

    // Build router
    let app = build_router(state).layer(cors);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
