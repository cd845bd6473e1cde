//! WebSocket transcript feed.
//!
//! One socket per thread view. The subscription is attached before the
//! stored messages are read, so nothing appended in between is lost;
//! replayed rows are deduplicated against the live stream by sequence.
//! Closing the socket drops the subscription handle, which detaches it
//! from the hub.

use axum::{
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::auth::CurrentUser;
use crate::chat::Message;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// `GET /api/threads/{id}/ws` -- stream a thread's transcript.
pub async fn thread_ws(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(thread_id): Path<String>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    state
        .repo
        .get_thread(user.id(), &thread_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Thread {} not found", thread_id)))?;

    debug!(user_id = %user.id(), thread_id = %thread_id, "Transcript feed attached");
    Ok(ws.on_upgrade(move |socket| run_transcript(socket, state, thread_id)))
}

async fn run_transcript(socket: WebSocket, state: AppState, thread_id: String) {
    let mut subscription = state.hub.subscribe(&thread_id);

    let existing = match state.repo.list_messages(&thread_id).await {
        Ok(messages) => messages,
        Err(err) => {
            warn!(thread_id = %thread_id, error = %err, "Failed to load transcript history");
            return;
        }
    };

    let (mut sender, mut receiver) = socket.split();

    // Replay everything already stored, in insertion order.
    let mut last_seq = 0;
    for message in existing {
        last_seq = message.seq;
        if send_message(&mut sender, &message).await.is_err() {
            return;
        }
    }

    // Then forward live appends until either side goes away.
    loop {
        tokio::select! {
            appended = subscription.recv() => {
                match appended {
                    Some(message) => {
                        // Already delivered during replay.
                        if message.seq <= last_seq {
                            continue;
                        }
                        last_seq = message.seq;
                        if send_message(&mut sender, &message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                    // Clients only listen on this socket; ignore anything else.
                    Some(Ok(_)) => continue,
                }
            }
        }
    }

    debug!(thread_id = %thread_id, "Transcript feed detached");
}

async fn send_message(
    sender: &mut (impl SinkExt<WsMessage> + Unpin),
    message: &Message,
) -> Result<(), ()> {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "Failed to serialize transcript message");
            return Err(());
        }
    };

    sender
        .send(WsMessage::Text(payload.into()))
        .await
        .map_err(|_| ())
}
