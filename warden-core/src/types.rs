//! Provider-agnostic conversation types
//!
//! These are the shapes the agent loop exchanges with a [`ModelProvider`](crate::provider::ModelProvider):
//! messages made of text, tool-use requests and tool results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a new user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Create a new assistant message with text content
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Create a new user message carrying tool results
    pub fn tool_results(results: Vec<ToolResultBlock>) -> Self {
        Self {
            role: Role::User,
            content: results.into_iter().map(ContentBlock::ToolResult).collect(),
        }
    }

    /// Create an assistant message with text and tool use blocks
    pub fn assistant_with_tool_use(text: impl Into<String>, tool_uses: Vec<ToolUseBlock>) -> Self {
        let mut content = vec![ContentBlock::text(text)];
        content.extend(tool_uses.into_iter().map(ContentBlock::ToolUse));
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// Create an assistant message with arbitrary content blocks
    pub fn assistant_with_content(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// Text segments of this message, in order
    pub fn text_segments(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|c| match c {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All text segments joined with newlines
    pub fn text(&self) -> String {
        self.text_segments().join("\n")
    }

    /// Get all tool use blocks, in order
    pub fn tool_uses(&self) -> Vec<&ToolUseBlock> {
        self.content
            .iter()
            .filter_map(|c| match c {
                ContentBlock::ToolUse(t) => Some(t),
                _ => None,
            })
            .collect()
    }
}

/// Content block within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },
    /// Tool use request from assistant
    ToolUse(ToolUseBlock),
    /// Tool result from user
    ToolResult(ToolResultBlock),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}

/// A tool use request from the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseBlock {
    /// Unique ID for this tool use (used to match with result)
    pub id: String,
    /// Tool name
    pub name: String,
    /// Tool input parameters as JSON
    pub input: Value,
}

/// Result of a tool execution, fed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultBlock {
    /// ID of the tool use this is a result for
    pub tool_use_id: String,
    /// Serialized outcome text
    pub content: String,
    pub status: ToolResultStatus,
}

impl ToolResultBlock {
    pub fn is_error(&self) -> bool {
        self.status == ToolResultStatus::Error
    }
}

/// Status of a tool result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultStatus {
    Success,
    Error,
}

/// Definition of a tool available to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for input parameters
    pub input_schema: Value,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response
    EndTurn,
    /// Model wants to use a tool
    ToolUse,
    /// Hit max token limit
    MaxTokens,
    /// Stop sequence encountered
    StopSequence,
    /// Content was filtered
    ContentFiltered,
    /// Unknown/other reason
    #[default]
    Unknown,
}

impl StopReason {
    /// Parse a provider's stop reason string. Anything unrecognized is
    /// [`StopReason::Unknown`].
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            "refusal" | "content_filtered" => StopReason::ContentFiltered,
            _ => StopReason::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_message_text_joins_segments_with_newlines() {
        let msg = Message::assistant_with_content(vec![
            ContentBlock::text("first"),
            ContentBlock::ToolUse(ToolUseBlock {
                id: "1".to_string(),
                name: "read_file".to_string(),
                input: serde_json::json!({}),
            }),
            ContentBlock::text("second"),
        ]);
        assert_eq!(msg.text(), "first\nsecond");
    }

    #[test]
    fn test_message_text_no_text_blocks() {
        let msg = Message::tool_results(vec![ToolResultBlock {
            tool_use_id: "1".to_string(),
            content: "ok".to_string(),
            status: ToolResultStatus::Success,
        }]);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "");
        assert!(msg.text_segments().is_empty());
    }

    #[test]
    fn test_message_assistant_with_tool_use_preserves_order() {
        let tool_uses = vec![
            ToolUseBlock {
                id: "first".to_string(),
                name: "read_file".to_string(),
                input: serde_json::json!({}),
            },
            ToolUseBlock {
                id: "second".to_string(),
                name: "write_file".to_string(),
                input: serde_json::json!({}),
            },
        ];

        let msg = Message::assistant_with_tool_use("Working", tool_uses);

        assert!(matches!(&msg.content[0], ContentBlock::Text { .. }));
        let uses = msg.tool_uses();
        assert_eq!(uses.len(), 2);
        assert_eq!(uses[0].id, "first");
        assert_eq!(uses[1].id, "second");
    }

    #[test]
    fn test_content_block_wire_shape() {
        let json = serde_json::to_value(ContentBlock::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "text", "text": "hi"}));

        let json = serde_json::to_value(ContentBlock::ToolUse(ToolUseBlock {
            id: "tu_1".to_string(),
            name: "list_directory".to_string(),
            input: serde_json::json!({"path": "."}),
        }))
        .unwrap();
        assert_eq!(json["type"], "tool_use");
        assert_eq!(json["name"], "list_directory");
    }

    #[test]
    fn test_stop_reason_from_wire() {
        assert_eq!(StopReason::from_wire("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_wire("tool_use"), StopReason::ToolUse);
        assert_eq!(StopReason::from_wire("max_tokens"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_wire("pause_turn"), StopReason::Unknown);
    }
}
