//! Tool requests, outcomes and the handler seam the agent dispatches through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{ToolDefinition, ToolResultBlock, ToolResultStatus, ToolUseBlock};

/// A single operation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ToolRequest {
    pub fn new(name: impl Into<String>, parameters: Value) -> Self {
        let parameters = match parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// A string parameter, if present and a string.
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// The resource path this request touches: `path`, else
    /// `working_directory`. Empty strings count as absent.
    pub fn resource_path(&self) -> Option<&str> {
        self.str_param("path")
            .filter(|p| !p.is_empty())
            .or_else(|| self.str_param("working_directory").filter(|p| !p.is_empty()))
    }
}

impl From<&ToolUseBlock> for ToolRequest {
    fn from(block: &ToolUseBlock) -> Self {
        ToolRequest::new(block.name.clone(), block.input.clone())
    }
}

/// Why a tool request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    PermissionDenied,
    UnsafeCommand,
    Timeout,
    NotFound,
    EncodingError,
    OsError,
    InvalidInput,
    Unknown,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ToolErrorKind::PermissionDenied => "permission_denied",
            ToolErrorKind::UnsafeCommand => "unsafe_command",
            ToolErrorKind::Timeout => "timeout",
            ToolErrorKind::NotFound => "not_found",
            ToolErrorKind::EncodingError => "encoding_error",
            ToolErrorKind::OsError => "os_error",
            ToolErrorKind::InvalidInput => "invalid_input",
            ToolErrorKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// The structured result of executing a [`ToolRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    pub payload: Option<Value>,
    pub error_kind: Option<ToolErrorKind>,
    pub error_detail: Option<String>,
}

impl ToolOutcome {
    pub fn ok(payload: impl Into<Value>) -> Self {
        Self {
            success: true,
            payload: Some(payload.into()),
            error_kind: None,
            error_detail: None,
        }
    }

    pub fn failure(kind: ToolErrorKind, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error_kind: Some(kind),
            error_detail: Some(detail.into()),
        }
    }

    /// A failure that still carries data, such as a command's captured output.
    pub fn failure_with_payload(
        kind: ToolErrorKind,
        detail: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            payload: Some(payload),
            ..Self::failure(kind, detail)
        }
    }

    /// Text sent back to the model for this outcome.
    ///
    /// Success is the payload as indented JSON; failure is `Error: <detail>`.
    pub fn to_result_content(&self) -> String {
        if self.success {
            let payload = self.payload.as_ref().unwrap_or(&Value::Null);
            serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
        } else {
            format!(
                "Error: {}",
                self.error_detail.as_deref().unwrap_or("Unknown error")
            )
        }
    }

    /// Wrap this outcome as a result block answering `tool_use_id`.
    pub fn into_result_block(self, tool_use_id: impl Into<String>) -> ToolResultBlock {
        ToolResultBlock {
            tool_use_id: tool_use_id.into(),
            content: self.to_result_content(),
            status: if self.success {
                ToolResultStatus::Success
            } else {
                ToolResultStatus::Error
            },
        }
    }
}

/// Something that can describe and run tools on the agent's behalf.
///
/// Implementations must not panic or return errors for bad requests: every
/// failure is reported through [`ToolOutcome`].
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Schemas of the tools currently offered to the model.
    fn definitions(&self) -> Vec<ToolDefinition>;

    async fn execute(&self, request: ToolRequest) -> ToolOutcome;
}
