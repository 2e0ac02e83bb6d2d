//! Agent-related types

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::provider::ProviderError;
use crate::tool::ToolErrorKind;
use crate::types::Message;

/// Default ceiling on inference calls per run
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Default bound on a single inference call
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(120);

/// Default output token budget per inference call
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Appended to the reply when the iteration ceiling is hit
pub const MAX_ITERATIONS_NOTICE: &str = "\n\n(Note: Maximum tool iterations reached)";

/// Reply when the model finishes without any text
pub const EMPTY_RESPONSE_MESSAGE: &str = "Sorry, I received an empty response.";

/// Reply when an inference call exceeds its timeout
pub const INFERENCE_TIMEOUT_MESSAGE: &str =
    "Sorry, the AI service took too long to respond. Please try again.";

/// Reply for any other failure during a run
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while processing your request. Please try again.";

/// Errors that can occur during agent execution
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model provider errors (API calls, authentication, rate limits)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// An inference call did not finish in time
    #[error("Inference call timed out after {0:?}")]
    InferenceTimeout(Duration),

    /// The agent was built with invalid settings
    #[error("Invalid agent configuration: {0}")]
    Configuration(String),
}

impl AgentError {
    /// The short reply shown to the end user for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            AgentError::InferenceTimeout(_) => INFERENCE_TIMEOUT_MESSAGE,
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model produced a final answer
    Completed,
    /// An inline `@skill` answered without inference
    SkillShortcut,
    /// The iteration ceiling was hit; the text carries a notice
    MaxIterationsReached,
    /// The run failed; the text is a short apology
    Failed,
}

/// Response from Agent.run() containing the result and execution statistics
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The final text response from the agent
    pub text: String,
    pub outcome: RunOutcome,
    /// All tool calls made during this run, in execution order
    pub tool_calls: Vec<ToolCallInfo>,
    /// Total token usage across all model calls (if available)
    pub token_usage: Option<TokenUsageStats>,
    /// Total execution time
    pub duration: Duration,
    /// Number of model calls made
    pub model_calls: usize,
    /// The conversation as it stood when the run ended, prior history
    /// included. Empty for failed runs and skill shortcuts.
    pub messages: Vec<Message>,
}

impl AgentResponse {
    /// Get just the text response
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

impl std::fmt::Display for AgentResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<AgentResponse> for String {
    fn from(response: AgentResponse) -> Self {
        response.text
    }
}

impl PartialEq<&str> for AgentResponse {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

/// Information about a tool call made during agent execution
#[derive(Debug, Clone)]
pub struct ToolCallInfo {
    /// Tool use id assigned by the model
    pub id: String,
    /// Tool name
    pub name: String,
    /// Input parameters (as JSON)
    pub input: Value,
    /// Result content sent back to the model
    pub output: String,
    /// Whether the tool succeeded
    pub success: bool,
    /// Failure classification, if it failed
    pub error_kind: Option<ToolErrorKind>,
    /// Execution duration
    pub duration: Duration,
}

/// Cumulative token usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsageStats {
    /// Total input tokens across all model calls
    pub input_tokens: usize,
    /// Total output tokens across all model calls
    pub output_tokens: usize,
}

impl TokenUsageStats {
    /// Total tokens (input + output)
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}
