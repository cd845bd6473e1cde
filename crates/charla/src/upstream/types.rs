//! Upstream completion wire types.

use serde::{Deserialize, Serialize};

/// Reply substituted when the upstream payload has no extractable content.
pub const NO_REPLY_FALLBACK: &str = "(no reply)";

/// One turn of a chat completion conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    /// Build a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Build a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `/v1/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatTurn>,
    pub temperature: f32,
}

/// Response body from `/v1/chat/completions`, reduced to what we read.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

/// The message inside a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Extract the reply text, falling back to [`NO_REPLY_FALLBACK`]
    /// when the payload carries no content.
    pub fn reply(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_else(|| NO_REPLY_FALLBACK.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_extraction() {
        let response: CompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
        }))
        .unwrap();
        assert_eq!(response.reply(), "hi there");
    }

    #[test]
    fn test_reply_fallback_on_empty_choices() {
        let response: CompletionResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(response.reply(), NO_REPLY_FALLBACK);
    }

    #[test]
    fn test_reply_fallback_on_missing_content() {
        let response: CompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant"}}]
        }))
        .unwrap();
        assert_eq!(response.reply(), NO_REPLY_FALLBACK);
    }
}
