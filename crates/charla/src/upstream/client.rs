//! HTTP client for the upstream completion API.

use tracing::debug;

use crate::config::UpstreamConfig;

use super::error::{UpstreamError, UpstreamResult};
use super::types::{ChatTurn, CompletionRequest, CompletionResponse};

/// Client for an OpenAI-compatible chat completions endpoint.
///
/// Holds the server-side credential; one request per call, no retries,
/// no streaming, transport-default timeout.
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl CompletionClient {
    /// Create a client from upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Send one completion request and extract the reply text.
    pub async fn complete(&self, messages: Vec<ChatTurn>) -> UpstreamResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential)?;

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, "Forwarding completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: CompletionResponse = response.json().await?;
        Ok(payload.reply())
    }
}
