//! Wire types for the OpenAI-compatible chat completions and embeddings
//! APIs. Field names follow the upstream snake_case JSON format, so no
//! serde renames are needed.

use serde::{Deserialize, Serialize};

/// A chat message on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireMessage {
    /// `system`, `user`, or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl WireMessage {
    /// Build a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Build a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Build an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// `POST /chat/completions` request body.
#[derive(Clone, Debug, Serialize)]
pub struct ChatCompletionRequest {
    /// Model ID.
    pub model: String,
    /// Conversation, system prompt first.
    pub messages: Vec<WireMessage>,
    /// Completion token ceiling.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// One completion choice in the response.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatChoice {
    /// The generated message.
    pub message: WireMessage,
    /// Why generation stopped (`stop`, `length`, ...).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage block in API responses.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct WireUsage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Completion tokens.
    #[serde(default)]
    pub completion_tokens: u64,
}

/// `POST /chat/completions` response body.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// Model that served the request.
    pub model: String,
    /// Completion choices (we request one).
    pub choices: Vec<ChatChoice>,
    /// Token usage.
    #[serde(default)]
    pub usage: WireUsage,
}

/// `POST /embeddings` request body.
#[derive(Clone, Debug, Serialize)]
pub struct EmbeddingRequest {
    /// Embedding model ID.
    pub model: String,
    /// Text to embed.
    pub input: String,
}

/// One embedding in the response.
#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingData {
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

/// `POST /embeddings` response body.
#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingResponse {
    /// Embeddings, one per input.
    pub data: Vec<EmbeddingData>,
    /// Token usage.
    #[serde(default)]
    pub usage: WireUsage,
}

/// Error payload shape returned by the API.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiErrorBody {
    /// The error object.
    pub error: ApiErrorDetail,
}

/// Error detail inside [`ApiErrorBody`].
#[derive(Clone, Debug, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Machine-readable error type.
    #[serde(default)]
    pub r#type: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_message_constructors() {
        assert_eq!(WireMessage::system("s").role, "system");
        assert_eq!(WireMessage::user("u").role, "user");
        assert_eq!(WireMessage::assistant("a").role, "assistant");
    }

    #[test]
    fn request_serializes_snake_case() {
        let req = ChatCompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![WireMessage::user("hi")],
            max_tokens: 100,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn response_deserializes() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4}
        }))
        .unwrap();
        assert_eq!(resp.choices[0].message.content, "hello");
        assert_eq!(resp.usage.prompt_tokens, 12);
    }

    #[test]
    fn response_tolerates_missing_usage() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "model": "m",
            "choices": [{"message": {"role": "assistant", "content": "x"}}]
        }))
        .unwrap();
        assert_eq!(resp.usage.prompt_tokens, 0);
        assert!(resp.choices[0].finish_reason.is_none());
    }

    #[test]
    fn error_body_deserializes() {
        let body: ApiErrorBody = serde_json::from_value(json!({
            "error": {"message": "Rate limit reached", "type": "rate_limit_error"}
        }))
        .unwrap();
        assert_eq!(body.error.message, "Rate limit reached");
        assert_eq!(body.error.r#type.as_deref(), Some("rate_limit_error"));
    }
}
