//! Tool execution for Agent

use std::time::Instant;

use async_trait::async_trait;

use crate::events::AgentEvent;
use crate::tool::{ToolErrorKind, ToolHandler, ToolOutcome, ToolRequest};
use crate::types::{ToolDefinition, ToolResultBlock, ToolUseBlock};

use super::types::ToolCallInfo;
use super::Agent;

/// Handler used when the agent was built without tools
pub(super) struct NoTools;

#[async_trait]
impl ToolHandler for NoTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    async fn execute(&self, request: ToolRequest) -> ToolOutcome {
        ToolOutcome::failure(
            ToolErrorKind::InvalidInput,
            format!("Tool '{}' is not registered", request.name),
        )
    }
}

impl Agent {
    /// Run every requested tool, one at a time, in the order the model
    /// listed them. Returns one result block per request.
    pub(super) async fn execute_tool_calls(
        &self,
        tool_uses: &[ToolUseBlock],
        tool_call_infos: &mut Vec<ToolCallInfo>,
    ) -> Vec<ToolResultBlock> {
        let mut results = Vec::with_capacity(tool_uses.len());
        for tool_use in tool_uses {
            results.push(self.execute_tool(tool_use, tool_call_infos).await);
        }
        results
    }

    async fn execute_tool(
        &self,
        tool_use: &ToolUseBlock,
        tool_call_infos: &mut Vec<ToolCallInfo>,
    ) -> ToolResultBlock {
        let tool_start = Instant::now();

        // Emit ToolRequested (always fires exactly once)
        self.emit_event(AgentEvent::ToolRequested {
            tool_use_id: tool_use.id.clone(),
            name: tool_use.name.clone(),
            input: tool_use.input.clone(),
        });
        tracing::info!(tool = %tool_use.name, id = %tool_use.id, "executing tool");
        tracing::debug!(tool = %tool_use.name, input = %tool_use.input, "tool input");

        let outcome = self.tools.execute(ToolRequest::from(tool_use)).await;
        let duration = tool_start.elapsed();

        if outcome.success {
            self.emit_event(AgentEvent::ToolCompleted {
                tool_use_id: tool_use.id.clone(),
                name: tool_use.name.clone(),
                duration,
            });
        } else {
            self.emit_event(AgentEvent::ToolFailed {
                tool_use_id: tool_use.id.clone(),
                name: tool_use.name.clone(),
                kind: outcome.error_kind.unwrap_or(ToolErrorKind::Unknown),
                error: outcome.error_detail.clone().unwrap_or_default(),
                duration,
            });
        }
        tracing::info!(
            tool = %tool_use.name,
            success = outcome.success,
            error_kind = ?outcome.error_kind,
            elapsed_ms = duration.as_millis() as u64,
            "tool completed"
        );

        let success = outcome.success;
        let error_kind = outcome.error_kind;
        let block = outcome.into_result_block(tool_use.id.clone());

        tool_call_infos.push(ToolCallInfo {
            id: tool_use.id.clone(),
            name: tool_use.name.clone(),
            input: tool_use.input.clone(),
            output: block.content.clone(),
            success,
            error_kind,
            duration,
        });

        block
    }
}
