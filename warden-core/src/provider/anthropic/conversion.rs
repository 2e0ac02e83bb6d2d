//! Conversion between conversation types and the Messages API wire format

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::events::TokenUsage;
use crate::model::{ModelRequest, ModelResponse};
use crate::types::{ContentBlock, Message, StopReason, ToolDefinition, ToolUseBlock};

#[derive(Debug, Serialize)]
pub(super) struct WireRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    pub messages: Vec<Value>,
}

impl<'a> WireRequest<'a> {
    pub fn new(model: &'a str, request: &'a ModelRequest) -> Self {
        Self {
            model,
            max_tokens: request.max_tokens,
            system: request.system_prompt.as_deref(),
            tools: request.tools.iter().map(to_wire_tool).collect(),
            messages: request.messages.iter().map(to_wire_message).collect(),
        }
    }
}

fn to_wire_tool(tool: &ToolDefinition) -> Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.input_schema,
    })
}

pub(super) fn to_wire_message(message: &Message) -> Value {
    let content: Vec<Value> = message
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => json!({"type": "text", "text": text}),
            ContentBlock::ToolUse(tool_use) => json!({
                "type": "tool_use",
                "id": tool_use.id,
                "name": tool_use.name,
                "input": tool_use.input,
            }),
            ContentBlock::ToolResult(result) => json!({
                "type": "tool_result",
                "tool_use_id": result.tool_use_id,
                "content": result.content,
                "is_error": result.is_error(),
            }),
        })
        .collect();

    json!({"role": message.role.to_string(), "content": content})
}

#[derive(Debug, Deserialize)]
pub(super) struct WireResponse {
    #[serde(default)]
    pub content: Vec<WireBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(super) enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireUsage {
    #[serde(default)]
    pub input_tokens: usize,
    #[serde(default)]
    pub output_tokens: usize,
}

/// Convert an API response into a [`ModelResponse`]. Block types the loop
/// does not understand (thinking, server tools) are dropped.
pub(super) fn from_wire_response(response: WireResponse) -> ModelResponse {
    let content = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            WireBlock::Text { text } => Some(ContentBlock::Text { text }),
            WireBlock::ToolUse { id, name, input } => {
                Some(ContentBlock::ToolUse(ToolUseBlock { id, name, input }))
            }
            WireBlock::Other => None,
        })
        .collect();

    ModelResponse {
        message: Message::assistant_with_content(content),
        stop_reason: response
            .stop_reason
            .as_deref()
            .map(StopReason::from_wire)
            .unwrap_or_default(),
        usage: response.usage.map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        }),
    }
}
