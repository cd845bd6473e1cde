//! Authentication handlers.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::auth::{AUTH_COOKIE, CurrentUser, token_from_cookie_header};

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Principal info returned to clients.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Login endpoint: verify credentials, set the session cookie.
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .auth
        .verify_credentials(&request.username, &request.password)
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    let token = state
        .auth
        .generate_token(user)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        AUTH_COOKIE,
        token,
        60 * 60 * 24 // 24 hours
    );

    info!(user_id = %user.id, "User logged in");

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            token,
            user: UserInfo {
                id: user.id.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
            },
        }),
    ))
}

/// Logout endpoint: clear the cookie and drop the caller's active
/// thread pointer. Best-effort on the pointer -- an already-invalid
/// token still gets its cookie cleared.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let token = headers
        .get(axum::http::header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookie_header| token_from_cookie_header(cookie_header, AUTH_COOKIE));

    if let Some(token) = token
        && let Ok(claims) = state.auth.validate_token(token)
    {
        state.sessions.clear(&claims.sub);
        info!(user_id = %claims.sub, "User logged out");
    }

    // Clear the auth cookie by setting it to empty with immediate expiry
    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", AUTH_COOKIE);

    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        StatusCode::NO_CONTENT,
    )
}

/// Get the signed-in principal.
pub async fn me(user: CurrentUser) -> Json<UserInfo> {
    Json(UserInfo {
        id: user.id().to_string(),
        name: user.display_name().to_string(),
        email: user.email().to_string(),
    })
}
