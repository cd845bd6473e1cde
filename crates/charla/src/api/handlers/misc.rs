//! Miscellaneous handlers (health, embedded chat page).

use axum::{Json, response::Html};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Health check endpoint.
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Embedded chat page, served when no static directory is configured
/// and as the catch-all root document.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../../static/index.html"))
}
