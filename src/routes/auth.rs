use axum::{extract::State, http::header::SET_COOKIE, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{issue_token, Session};
use crate::constants::SESSION_COOKIE;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub username: String,
}

/// Log in and receive a signed session cookie.
///
/// The cookie is stateless: username and expiry are HMAC-signed with the
/// server secret, so there is nothing to store or clean up server-side.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    if !state.verifier.verify(&payload.username, &payload.password) {
        tracing::warn!("Failed login attempt for {}", payload.username);
        return Err(AppError::InvalidCredentials);
    }

    let ttl_secs = state.config.session_ttl_hours * 3600;
    let expires_at = chrono::Utc::now().timestamp() + ttl_secs;
    let token = issue_token(&payload.username, expires_at, &state.config.session_secret);

    let cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_secs}"
    );

    tracing::info!("User {} logged in", payload.username);

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            status: "success",
            username: payload.username,
        }),
    ))
}

/// Log out by expiring the session cookie.
pub async fn logout() -> impl IntoResponse {
    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    ([(SET_COOKIE, cookie)], Json(json!({ "status": "success" })))
}

/// Report whether the caller holds a valid session. Never 401; the frontend
/// polls this to decide whether to show the login form.
pub async fn auth_status(session: Option<Session>) -> Json<Value> {
    match session {
        Some(session) => Json(json!({
            "authenticated": true,
            "username": session.username,
        })),
        None => Json(json!({ "authenticated": false })),
    }
}
