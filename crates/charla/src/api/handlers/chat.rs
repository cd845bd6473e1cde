//! Completion proxy handler.
//!
//! The one endpoint that touches the upstream credential. Clients send
//! either a bare prompt (wrapped into a one-shot system+user pair) or a
//! full message array used verbatim.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::relay::SYSTEM_PROMPT;
use crate::upstream::{ChatTurn, UpstreamError};

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// Request body for the chat proxy.
#[derive(Debug, Deserialize)]
pub struct ChatProxyRequest {
    /// One-shot prompt, wrapped with the fixed system prompt.
    pub prompt: Option<String>,
    /// Full conversation, used verbatim when non-empty.
    pub messages: Option<Vec<ChatTurn>>,
}

/// Response body for the chat proxy.
#[derive(Debug, Serialize)]
pub struct ChatProxyResponse {
    pub reply: String,
}

/// `POST /api/chat` -- forward to the upstream completion API.
#[instrument(skip(state, request))]
pub async fn chat_proxy(
    State(state): State<AppState>,
    Json(request): Json<ChatProxyRequest>,
) -> ApiResult<Json<ChatProxyResponse>> {
    let turns = match request.messages {
        Some(messages) if !messages.is_empty() => messages,
        _ => {
            let mut turns = vec![ChatTurn::system(SYSTEM_PROMPT)];
            if let Some(prompt) = request.prompt {
                turns.push(ChatTurn::user(prompt));
            }
            turns
        }
    };

    match state.completion.complete(turns).await {
        Ok(reply) => Ok(Json(ChatProxyResponse { reply })),
        Err(UpstreamError::Status { body, .. }) => {
            Err(ApiError::internal("OpenAI request failed").with_detail(body))
        }
        Err(err) => Err(ApiError::server_fault(err.to_string())),
    }
}
