//! API route definitions.

use std::path::Path;

use axum::http::{HeaderValue, Method, header};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::auth_middleware;

use super::handlers;
use super::state::AppState;
use super::ws;

/// Create the application router.
///
/// `static_dir` overrides the embedded chat page with an on-disk asset
/// directory (unknown paths fall back to its `index.html`).
pub fn create_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let cors = build_cors_layer(&state);

    // Tracing layer with request timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let auth_state = state.auth.clone();

    // Protected routes (require authentication)
    let protected_routes = Router::new()
        .route("/api/me", get(handlers::me))
        .route(
            "/api/threads",
            get(handlers::list_threads).post(handlers::create_thread),
        )
        .route("/api/threads/ensure", post(handlers::ensure_thread))
        .route(
            "/api/threads/{thread_id}",
            axum::routing::patch(handlers::rename_thread).delete(handlers::delete_thread),
        )
        .route(
            "/api/threads/{thread_id}/messages",
            get(handlers::list_messages),
        )
        .route("/api/threads/{thread_id}/send", post(handlers::send_message))
        .route("/api/threads/{thread_id}/ws", get(ws::thread_ws))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(state.clone());

    // Public routes (no authentication)
    let public_routes = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/chat", post(handlers::chat_proxy))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .with_state(state);

    let router = Router::new().merge(public_routes).merge(protected_routes);

    // Static assets with the chat page as the catch-all document.
    let router = match static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html"))),
        ),
        None => router.fallback(handlers::index),
    };

    router.layer(cors).layer(trace_layer)
}

/// Build the CORS layer from configured origins.
///
/// With no configured origins, cross-origin requests are left to the
/// browser's same-origin policy.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins = state.auth.allowed_origins();

    if allowed_origins.is_empty() {
        return CorsLayer::new();
    }

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
    ];

    let headers = [
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        header::ORIGIN,
        header::COOKIE,
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("CORS: Invalid origin in config: {}", origin);
                None
            })
        })
        .collect();

    if origins.is_empty() {
        tracing::error!("CORS: All configured origins are invalid!");
        CorsLayer::new()
    } else {
        tracing::info!("CORS: Allowing {} origin(s)", origins.len());
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true)
    }
}
