use axum::{async_trait, extract::FromRequestParts, http::header::COOKIE, http::request::Parts};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::constants::SESSION_COOKIE;
use crate::error::AppError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Credential Verification
// =============================================================================

/// Checks a username/password pair at login.
///
/// The verification strategy is injected into [`AppState`] so it can be
/// swapped (static table, hashed store, external provider) without touching
/// the request handlers.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Fixed in-process username/password table, loaded once from configuration.
/// There is no account-creation flow; the table is immutable at runtime.
pub struct StaticCredentials {
    pairs: Vec<(String, String)>,
}

impl StaticCredentials {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.pairs
            .iter()
            .any(|(u, p)| u == username && p == password)
    }
}

// =============================================================================
// Session Tokens
// =============================================================================

/// Mint a signed session token: `username.expiry.hex(HMAC(secret, payload))`.
///
/// Stateless on the server side; the signature covers the username and the
/// expiry so neither can be tampered with.
pub fn issue_token(username: &str, expires_at: i64, secret: &str) -> String {
    let payload = format!("{username}.{expires_at}");
    format!("{payload}.{}", sign(&payload, secret))
}

/// Verify a session token and return the username if it is authentic and
/// not expired.
pub fn verify_token(token: &str, secret: &str, now: i64) -> Option<String> {
    // Usernames must not contain '.'; split from the right so the signature
    // and expiry are unambiguous.
    let mut parts = token.rsplitn(3, '.');
    let signature = parts.next()?;
    let expires_at: i64 = parts.next()?.parse().ok()?;
    let username = parts.next()?;

    let payload = format!("{username}.{expires_at}");
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return None;
        }
    };
    mac.update(payload.as_bytes());
    let sig_bytes = hex::decode(signature).ok()?;
    mac.verify_slice(&sig_bytes).ok()?;

    if expires_at <= now {
        tracing::debug!("Expired session token for {}", username);
        return None;
    }
    Some(username.to_string())
}

fn sign(payload: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

// =============================================================================
// Session Extractor
// =============================================================================

/// Authenticated session, extracted from the `session` cookie.
///
/// Handlers that take a `Session` argument reject unauthenticated requests
/// with 401 before running.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
}

/// Read a named cookie out of the `Cookie` header(s).
pub fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(parts, SESSION_COOKIE).ok_or(AppError::Unauthorized)?;
        let now = chrono::Utc::now().timestamp();
        let username = verify_token(token, &state.config.session_secret, now)
            .ok_or(AppError::Unauthorized)?;
        Ok(Session { username })
    }
}
