//! Thread and message handlers.
//!
//! Every thread-scoped route checks ownership first: a thread that does
//! not exist under the caller's id is a 404, whoever it belongs to.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::chat::{Message, Thread};

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

async fn owned_thread(state: &AppState, user: &CurrentUser, thread_id: &str) -> ApiResult<Thread> {
    state
        .repo
        .get_thread(user.id(), thread_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Thread {} not found", thread_id)))
}

/// List the caller's threads in insertion order.
#[instrument(skip(state, user))]
pub async fn list_threads(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Thread>>> {
    let threads = state.repo.list_threads(user.id()).await?;
    Ok(Json(threads))
}

/// Ensure the caller has an active thread, creating one if needed.
#[instrument(skip(state, user))]
pub async fn ensure_thread(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Thread>> {
    let thread = state.sessions.ensure_thread(user.id()).await?;
    Ok(Json(thread))
}

/// Request to create a thread.
#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub title: Option<String>,
}

/// Create a thread and adopt it as active.
#[instrument(skip(state, user, request))]
pub async fn create_thread(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateThreadRequest>,
) -> ApiResult<impl IntoResponse> {
    let thread = state
        .sessions
        .create_thread(user.id(), request.title.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(thread)))
}

/// Delete a thread and its messages. Responds with the thread that is
/// active afterwards (possibly freshly created).
#[instrument(skip(state, user))]
pub async fn delete_thread(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Thread>> {
    owned_thread(&state, &user, &thread_id).await?;

    let active = state.sessions.delete_thread(user.id(), &thread_id).await?;
    Ok(Json(active))
}

/// Request to rename a thread.
#[derive(Debug, Deserialize)]
pub struct RenameThreadRequest {
    pub title: Option<String>,
}

/// Rename a thread. A missing or empty title is a no-op.
#[instrument(skip(state, user, request))]
pub async fn rename_thread(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(thread_id): Path<String>,
    Json(request): Json<RenameThreadRequest>,
) -> ApiResult<Json<Thread>> {
    owned_thread(&state, &user, &thread_id).await?;

    let title = request.title.unwrap_or_default();
    let thread = state
        .sessions
        .rename_thread(user.id(), &thread_id, &title)
        .await?;
    Ok(Json(thread))
}

/// List a thread's messages in insertion order.
#[instrument(skip(state, user))]
pub async fn list_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    owned_thread(&state, &user, &thread_id).await?;

    let messages = state.repo.list_messages(&thread_id).await?;
    Ok(Json(messages))
}

/// Request to send a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// Relay a prompt through the thread. Empty or whitespace-only text is
/// a no-op answered with 204.
#[instrument(skip(state, user, request))]
pub async fn send_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(thread_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Response> {
    owned_thread(&state, &user, &thread_id).await?;

    match state.relay.send(&thread_id, &request.text).await? {
        Some(receipt) => Ok(Json(receipt).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
