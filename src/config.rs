use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub data_file: String,
    pub github_config_file: String,
    pub github_api_base: String,
    pub allowed_origins: Vec<String>,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub sync_timeout_secs: u64,
    pub environment: String,
    /// Static username/password pairs; see [`crate::auth::StaticCredentials`].
    pub credentials: Vec<(String, String)>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let data_file =
            env::var("DATA_FILE").unwrap_or_else(|_| "./ingress_hack_data.json".to_string());

        let github_config_file =
            env::var("GITHUB_CONFIG_FILE").unwrap_or_else(|_| "./github_config.json".to_string());

        let github_api_base =
            env::var("GITHUB_API_BASE").unwrap_or_else(|_| "https://api.github.com".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set for session cookie signing")?;

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .map_err(|_| "Invalid SESSION_TTL_HOURS")?;

        let sync_timeout_secs = env::var("SYNC_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| "Invalid SYNC_TIMEOUT_SECS")?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let credentials = env::var("CREDENTIALS")
            .map_err(|_| {
                "CREDENTIALS must be set (comma-separated user:password pairs)".to_string()
            })
            .and_then(parse_credentials)?;

        Ok(Config {
            server_host,
            server_port,
            data_file,
            github_config_file,
            github_api_base,
            allowed_origins,
            session_secret,
            session_ttl_hours,
            sync_timeout_secs,
            environment,
            credentials,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_credentials(raw: String) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (user, pass) = entry
            .split_once(':')
            .ok_or_else(|| format!("Invalid CREDENTIALS entry: {entry}"))?;
        pairs.push((user.to_string(), pass.to_string()));
    }
    if pairs.is_empty() {
        return Err("CREDENTIALS must contain at least one user:password pair".to_string());
    }
    Ok(pairs)
}
