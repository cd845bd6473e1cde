//! Upstream completion client module.

mod client;
mod error;
mod types;

use async_trait::async_trait;

pub use client::CompletionClient;
pub use error::{UpstreamError, UpstreamResult};
pub use types::{ChatTurn, CompletionRequest, CompletionResponse, NO_REPLY_FALLBACK};

/// Minimal completion API abstraction for testability.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(&self, messages: Vec<ChatTurn>) -> UpstreamResult<String>;
}

#[async_trait]
impl CompletionApi for CompletionClient {
    async fn complete(&self, messages: Vec<ChatTurn>) -> UpstreamResult<String> {
        self.complete(messages).await
    }
}
