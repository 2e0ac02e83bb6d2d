//! Test utilities for warden-core.
//!
//! This module provides mock implementations for testing agents without
//! requiring real LLM provider credentials.
//!
//! Enable with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! warden-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use warden_core::{Agent, test_utils::MockProvider};
//!
//! # async fn example() -> Result<(), warden_core::AgentError> {
//! let provider = MockProvider::new()
//!     .with_text("Hello from mock!");
//!
//! let agent = Agent::builder()
//!     .provider(provider)
//!     .build()?;
//!
//! let response = agent.run("Hi").await;
//! assert_eq!(response.text(), "Hello from mock!");
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::events::{AgentEvent, TokenUsage};
use crate::model::{ModelRequest, ModelResponse};
use crate::provider::{ModelProvider, ProviderError};
use crate::tool::{ToolErrorKind, ToolHandler, ToolOutcome, ToolRequest};
use crate::types::{ContentBlock, Message, Role, StopReason, ToolDefinition, ToolUseBlock};

enum Scripted {
    Response(ModelResponse),
    Error(ProviderError),
}

#[derive(Default)]
struct MockState {
    queue: Vec<Scripted>,
    repeat: Option<ModelResponse>,
    requests: Vec<ModelRequest>,
    call_count: usize,
}

/// A mock model provider for testing.
///
/// Returns pre-programmed responses in order. Useful for testing agent behavior
/// without making real API calls.
///
/// # Example
///
/// ```rust
/// use warden_core::test_utils::MockProvider;
/// use serde_json::json;
///
/// // Simple text response
/// let provider = MockProvider::new()
///     .with_text("Hello!");
///
/// // Tool use followed by final response
/// let provider = MockProvider::new()
///     .with_tool_use("read_file", json!({"path": "notes.txt"}))
///     .with_text("The file says hello");
/// ```
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new mock provider with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text response to the queue.
    ///
    /// The response will have `StopReason::EndTurn`.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(ModelResponse::text(text, StopReason::EndTurn))
    }

    /// Add a tool use response to the queue.
    ///
    /// The response will have `StopReason::ToolUse`.
    pub fn with_tool_use(self, tool_name: impl Into<String>, tool_input: Value) -> Self {
        self.with_response(tool_use_response(None, tool_name.into(), tool_input))
    }

    /// Add a tool use response that also carries some text.
    pub fn with_text_and_tool_use(
        self,
        text: impl Into<String>,
        tool_name: impl Into<String>,
        tool_input: Value,
    ) -> Self {
        self.with_response(tool_use_response(
            Some(text.into()),
            tool_name.into(),
            tool_input,
        ))
    }

    /// Add an arbitrary response to the queue.
    pub fn with_response(self, response: ModelResponse) -> Self {
        self.state
            .lock()
            .unwrap()
            .queue
            .push(Scripted::Response(response));
        self
    }

    /// Add an error to the queue.
    pub fn with_error(self, error: ProviderError) -> Self {
        self.state.lock().unwrap().queue.push(Scripted::Error(error));
        self
    }

    /// Once the queue is empty, answer every call with this tool use.
    pub fn repeating_tool_use(self, tool_name: impl Into<String>, tool_input: Value) -> Self {
        self.state.lock().unwrap().repeat =
            Some(tool_use_response(None, tool_name.into(), tool_input));
        self
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times `generate` was called.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().call_count
    }

    /// Every request `generate` received, in order.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn tool_use_response(text: Option<String>, name: String, input: Value) -> ModelResponse {
    let mut content = Vec::new();
    if let Some(text) = text {
        content.push(ContentBlock::text(text));
    }
    content.push(ContentBlock::ToolUse(ToolUseBlock {
        id: format!("toolu_{}", uuid::Uuid::new_v4().simple()),
        name,
        input,
    }));
    ModelResponse {
        message: Message {
            role: Role::Assistant,
            content,
        },
        stop_reason: StopReason::ToolUse,
        usage: Some(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        }),
    }
}

/// Give a repeated tool use a fresh id so results stay distinguishable.
fn with_fresh_ids(mut response: ModelResponse) -> ModelResponse {
    for block in &mut response.message.content {
        if let ContentBlock::ToolUse(tool_use) = block {
            tool_use.id = format!("toolu_{}", uuid::Uuid::new_v4().simple());
        }
    }
    response
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "MockProvider"
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.call_count += 1;
        state.requests.push(request);

        if !state.queue.is_empty() {
            return match state.queue.remove(0) {
                Scripted::Response(response) => Ok(response),
                Scripted::Error(error) => Err(error),
            };
        }

        match &state.repeat {
            Some(response) => Ok(with_fresh_ids(response.clone())),
            None => Err(ProviderError::Other(
                "MockProvider: No more responses configured".to_string(),
            )),
        }
    }
}

/// A tool handler that answers every known tool with a canned payload.
///
/// Calls are recorded so tests can assert on what the agent ran.
#[derive(Clone, Default)]
pub struct MockToolHandler {
    tools: Vec<String>,
    failures: Arc<Mutex<Vec<(String, ToolErrorKind, String)>>>,
    calls: Arc<Mutex<Vec<ToolRequest>>>,
}

impl MockToolHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise a tool that succeeds, echoing its parameters.
    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.tools.push(name.into());
        self
    }

    /// Advertise a tool that always fails.
    pub fn with_failing_tool(
        mut self,
        name: impl Into<String>,
        kind: ToolErrorKind,
        detail: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.tools.push(name.clone());
        self.failures
            .lock()
            .unwrap()
            .push((name, kind, detail.into()));
        self
    }

    /// Names of the tools executed so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.name.clone())
            .collect()
    }

    /// Full requests executed so far.
    pub fn requests(&self) -> Vec<ToolRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolHandler for MockToolHandler {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|name| ToolDefinition {
                name: name.clone(),
                description: format!("Mock {} tool", name),
                input_schema: json!({"type": "object", "properties": {}}),
            })
            .collect()
    }

    async fn execute(&self, request: ToolRequest) -> ToolOutcome {
        self.calls.lock().unwrap().push(request.clone());

        let failure = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _, _)| *name == request.name)
            .map(|(_, kind, detail)| (*kind, detail.clone()));
        if let Some((kind, detail)) = failure {
            return ToolOutcome::failure(kind, detail);
        }

        if !self.tools.contains(&request.name) {
            return ToolOutcome::failure(
                ToolErrorKind::InvalidInput,
                format!("Unknown tool: {}", request.name),
            );
        }

        ToolOutcome::ok(json!({ "tool": request.name, "parameters": request.parameters }))
    }
}

/// Collects agent events for verification in tests.
///
/// Stores full [`AgentEvent`] objects and provides convenience methods
/// for inspecting event types.
///
/// # Example
///
/// ```rust
/// use warden_core::{Agent, test_utils::{MockProvider, EventCollector}};
///
/// # async fn example() -> Result<(), warden_core::AgentError> {
/// let provider = MockProvider::new().with_text("Hello!");
/// let collector = EventCollector::new();
///
/// let agent = Agent::builder()
///     .provider(provider)
///     .build()?;
///
/// agent.add_hook(collector.clone());
/// agent.run("Hi").await;
///
/// assert!(collector.has_event("run_started"));
/// assert!(collector.has_event("run_completed"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<AgentEvent>>>,
}

impl EventCollector {
    /// Create a new event collector.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all collected events.
    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Get all collected event type names.
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| Self::event_type_name(e).to_string())
            .collect()
    }

    /// Clear all collected events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Check if a specific event type was collected.
    pub fn has_event(&self, event_type: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|e| Self::event_type_name(e) == event_type)
    }

    /// Count occurrences of a specific event type.
    pub fn count_event(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| Self::event_type_name(e) == event_type)
            .count()
    }

    /// Get the number of collected events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Check if no events have been collected.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    fn event_type_name(event: &AgentEvent) -> &'static str {
        match event {
            AgentEvent::RunStarted { .. } => "run_started",
            AgentEvent::SkillInvoked { .. } => "skill_invoked",
            AgentEvent::RunCompleted { .. } => "run_completed",
            AgentEvent::RunFailed { .. } => "run_failed",
            AgentEvent::ModelCallStarted { .. } => "model_call_started",
            AgentEvent::ModelCallCompleted { .. } => "model_call_completed",
            AgentEvent::ToolRequested { .. } => "tool_requested",
            AgentEvent::ToolCompleted { .. } => "tool_completed",
            AgentEvent::ToolFailed { .. } => "tool_failed",
            AgentEvent::IterationLimitReached { .. } => "iteration_limit_reached",
        }
    }
}

impl Default for EventCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::events::AgentHook for EventCollector {
    fn on_event(&self, event: &AgentEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
