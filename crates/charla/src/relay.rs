//! Message relay: persist, forward, persist.
//!
//! A send is an explicit two-stage pipeline. The user's message is
//! written first and is never rolled back; the upstream call returns an
//! outcome instead of throwing across the boundary; the assistant write
//! always executes, its content chosen by that outcome. Upstream failure
//! therefore becomes an ordinary transcript entry and the feed needs no
//! separate error path.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::chat::{ChatRepository, Message, Role};
use crate::transcript::TranscriptHub;
use crate::upstream::{ChatTurn, CompletionApi};

/// System prompt wrapped around a one-shot user prompt.
pub const SYSTEM_PROMPT: &str = "You are a concise, helpful assistant.";

/// Transcript entry recorded when the upstream call fails.
pub const UPSTREAM_FAILURE_REPLY: &str = "Server error.";

/// Both messages appended by a completed send.
#[derive(Debug, Clone, Serialize)]
pub struct SendReceipt {
    pub user: Message,
    pub assistant: Message,
}

/// Relay between the chat store and the upstream completion API.
pub struct RelayService {
    repo: ChatRepository,
    completion: Arc<dyn CompletionApi>,
    hub: Arc<TranscriptHub>,
}

impl RelayService {
    /// Create a new relay.
    pub fn new(
        repo: ChatRepository,
        completion: Arc<dyn CompletionApi>,
        hub: Arc<TranscriptHub>,
    ) -> Self {
        Self {
            repo,
            completion,
            hub,
        }
    }

    /// Relay one prompt through the store and the upstream API.
    ///
    /// Returns `None` without touching the store or the upstream when
    /// the text is empty or whitespace-only. Each call is single-turn:
    /// prior thread history is not replayed into the request.
    pub async fn send(&self, thread_id: &str, text: &str) -> Result<Option<SendReceipt>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        // Stage one: the user's message is durably recorded before the
        // upstream is contacted, and stays recorded whatever follows.
        let user = self
            .repo
            .append_message(thread_id, Role::User, text)
            .await
            .context("recording user message")?;
        self.hub.publish(&user).await;

        let turns = vec![ChatTurn::system(SYSTEM_PROMPT), ChatTurn::user(text)];
        let reply = match self.completion.complete(turns).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(thread_id = %thread_id, error = %err, "Upstream completion failed");
                UPSTREAM_FAILURE_REPLY.to_string()
            }
        };

        // Stage two: always append the assistant entry.
        let assistant = self
            .repo
            .append_message(thread_id, Role::Assistant, &reply)
            .await
            .context("recording assistant message")?;
        self.hub.publish(&assistant).await;

        Ok(Some(SendReceipt { user, assistant }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::upstream::{UpstreamError, UpstreamResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted completion backend: counts calls, records the store
    /// state it observed, answers from a fixed script.
    struct ScriptedCompletion {
        reply: UpstreamResult<String>,
        calls: AtomicUsize,
        repo: ChatRepository,
        thread_id: String,
        observed_user_messages: AtomicUsize,
    }

    #[async_trait]
    impl CompletionApi for ScriptedCompletion {
        async fn complete(&self, _messages: Vec<ChatTurn>) -> UpstreamResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let count = self.repo.count_messages(&self.thread_id).await.unwrap();
            self.observed_user_messages
                .store(count as usize, Ordering::SeqCst);
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(UpstreamError::Status { status, body }) => Err(UpstreamError::Status {
                    status: *status,
                    body: body.clone(),
                }),
                Err(_) => Err(UpstreamError::MissingCredential),
            }
        }
    }

    async fn setup(
        reply: UpstreamResult<String>,
    ) -> (ChatRepository, Arc<ScriptedCompletion>, RelayService, String) {
        let db = Database::in_memory().await.unwrap();
        let repo = ChatRepository::new(db);
        let thread = repo.create_thread("u1", "chat").await.unwrap();

        let completion = Arc::new(ScriptedCompletion {
            reply,
            calls: AtomicUsize::new(0),
            repo: repo.clone(),
            thread_id: thread.id.clone(),
            observed_user_messages: AtomicUsize::new(0),
        });
        let hub = Arc::new(TranscriptHub::new());
        let relay = RelayService::new(repo.clone(), completion.clone(), hub);

        (repo, completion, relay, thread.id)
    }

    #[tokio::test]
    async fn test_empty_text_is_noop() {
        let (repo, completion, relay, thread_id) = setup(Ok("unused".to_string())).await;

        assert!(relay.send(&thread_id, "").await.unwrap().is_none());
        assert!(relay.send(&thread_id, "   \n\t").await.unwrap().is_none());

        assert_eq!(repo.count_messages(&thread_id).await.unwrap(), 0);
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_user_message_written_before_upstream_call() {
        let (_repo, completion, relay, thread_id) = setup(Ok("hi".to_string())).await;

        relay.send(&thread_id, "hello").await.unwrap();

        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
        // The upstream saw exactly the one user message already stored.
        assert_eq!(completion.observed_user_messages.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_appends_reply() {
        let (repo, _completion, relay, thread_id) = setup(Ok("hi there".to_string())).await;

        let receipt = relay.send(&thread_id, "hello").await.unwrap().unwrap();
        assert_eq!(receipt.user.content, "hello");
        assert_eq!(receipt.assistant.content, "hi there");

        let messages = repo.list_messages(&thread_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role(), Role::User);
        assert_eq!(messages[1].role(), Role::Assistant);
        assert_eq!(messages[1].content, "hi there");
    }

    #[tokio::test]
    async fn test_upstream_failure_becomes_transcript_entry() {
        let (repo, _completion, relay, thread_id) = setup(Err(UpstreamError::Status {
            status: 503,
            body: "overloaded".to_string(),
        }))
        .await;

        let receipt = relay.send(&thread_id, "hello").await.unwrap().unwrap();
        assert_eq!(receipt.assistant.content, UPSTREAM_FAILURE_REPLY);

        let messages = repo.list_messages(&thread_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].content, "Server error.");
    }

    #[tokio::test]
    async fn test_send_publishes_to_transcript() {
        let db = Database::in_memory().await.unwrap();
        let repo = ChatRepository::new(db);
        let thread = repo.create_thread("u1", "chat").await.unwrap();

        let completion = Arc::new(ScriptedCompletion {
            reply: Ok("hi there".to_string()),
            calls: AtomicUsize::new(0),
            repo: repo.clone(),
            thread_id: thread.id.clone(),
            observed_user_messages: AtomicUsize::new(0),
        });
        let hub = Arc::new(TranscriptHub::new());
        let relay = RelayService::new(repo, completion, hub.clone());

        let mut subscription = hub.subscribe(&thread.id);
        relay.send(&thread.id, "hello").await.unwrap();

        assert_eq!(subscription.recv().await.unwrap().content, "hello");
        assert_eq!(subscription.recv().await.unwrap().content, "hi there");
    }
}
