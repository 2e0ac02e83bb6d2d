//! Request and response shapes for a single inference call

use crate::events::TokenUsage;
use crate::types::{Message, StopReason, ToolDefinition};

/// Request parameters for model completion
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub messages: Vec<Message>,
    pub system_prompt: Option<String>,
    pub max_tokens: u32,
    pub tools: Vec<ToolDefinition>,
}

/// Response from a model completion
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// The assistant's response message
    pub message: Message,
    /// Why the model stopped generating
    pub stop_reason: StopReason,
    /// Token usage statistics (if provided by the model)
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    /// A response holding only text
    pub fn text(text: impl Into<String>, stop_reason: StopReason) -> Self {
        Self {
            message: Message::assistant(text),
            stop_reason,
            usage: None,
        }
    }
}
