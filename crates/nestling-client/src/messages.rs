//! Message types for the chat completions API.

use serde::{Deserialize, Serialize};

/// Request body for the chat completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0-2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Always `false`; analysis results are consumed whole.
    pub stream: bool,
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Role of the message author ("user", "assistant", "system").
    pub role: String,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Response from the chat completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Unique response identifier.
    pub id: Option<String>,
    /// Model that generated the response.
    pub model: Option<String>,
    /// Generated completion choices.
    pub choices: Vec<ChatChoice>,
    /// Token usage statistics.
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Text of the first choice, if it has any non-blank content.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .map(|m| m.content.trim())
            .filter(|t| !t.is_empty())
    }
}

/// A single completion choice in the response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// Index of this choice in the list.
    pub index: u32,
    /// Complete message.
    pub message: Option<ChatMessage>,
    /// Reason generation stopped ("stop", "length", etc.).
    pub finish_reason: Option<String>,
}

/// Token usage statistics for a completion.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}
