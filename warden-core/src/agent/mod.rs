//! Agent module: the bounded agentic tool loop
//!
//! The Agent sends the conversation to a [`ModelProvider`], runs any tools the
//! model asks for through a [`ToolHandler`], feeds the results back, and
//! repeats until the model answers or the iteration ceiling is reached.

mod builder;
mod helpers;
mod run;
mod tools;
mod types;

// Re-export public types
pub use builder::AgentBuilder;
pub use types::{
    AgentError, AgentResponse, RunOutcome, TokenUsageStats, ToolCallInfo,
    DEFAULT_INFERENCE_TIMEOUT, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOKENS,
    EMPTY_RESPONSE_MESSAGE, GENERIC_FAILURE_MESSAGE, INFERENCE_TIMEOUT_MESSAGE,
    MAX_ITERATIONS_NOTICE,
};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::events::{AgentEvent, AgentHook, HookId};
use crate::provider::ModelProvider;
use crate::skill::SkillRegistry;
use crate::tool::ToolHandler;

/// Agent that runs the bounded tool loop for one conversation turn at a time
///
/// Create an agent using the builder pattern:
///
/// ```ignore
/// use warden_core::Agent;
///
/// let agent = Agent::builder()
///     .provider(provider)
///     .tools(executor)
///     .with_system_prompt("You are a helpful assistant")
///     .build()?;
///
/// let response = agent.run("List the files here").await;
/// println!("{}", response);
/// ```
///
/// The agent holds no conversation state. Each run starts from the history
/// passed in, so one agent can serve several conversations.
pub struct Agent {
    pub(super) provider: Arc<dyn ModelProvider>,
    pub(super) tools: Arc<dyn ToolHandler>,
    pub(super) skills: Option<Arc<SkillRegistry>>,
    pub(super) system_prompt: Option<String>,
    pub(super) max_iterations: usize,
    pub(super) max_tokens: u32,
    pub(super) inference_timeout: Duration,
    pub(super) hooks: Arc<parking_lot::RwLock<Vec<(HookId, Arc<dyn AgentHook>)>>>,
    pub(super) next_hook_id: AtomicU64,
}

impl Agent {
    /// Add an event hook to observe agent execution
    ///
    /// Returns an id that can be passed to [`remove_hook`](Self::remove_hook).
    pub fn add_hook(&self, hook: impl AgentHook + 'static) -> HookId {
        let id = HookId(self.next_hook_id.fetch_add(1, Ordering::Relaxed));
        self.hooks.write().push((id, Arc::new(hook)));
        id
    }

    /// Remove a previously added hook. Returns whether it was present.
    pub fn remove_hook(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.write();
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    /// Emit an event to all registered hooks
    pub(crate) fn emit_event(&self, event: AgentEvent) {
        let hooks = self.hooks.read();
        for (_, hook) in hooks.iter() {
            hook.on_event(&event);
        }
    }

    /// Get the model name for display
    pub fn model_name(&self) -> &str {
        self.provider.name()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn inference_timeout(&self) -> Duration {
        self.inference_timeout
    }

    /// Names of the skills available for inline invocation
    pub fn skill_names(&self) -> Vec<String> {
        self.skills
            .as_ref()
            .map(|registry| registry.names())
            .unwrap_or_default()
    }
}
