//! AgentBuilder for fluent agent construction

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use crate::provider::ModelProvider;
use crate::skill::SkillRegistry;
use crate::tool::ToolHandler;

use super::tools::NoTools;
use super::types::{
    AgentError, DEFAULT_INFERENCE_TIMEOUT, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOKENS,
};
use super::Agent;

/// Builder for creating an Agent with fluent configuration
///
/// Use `Agent::builder()` to create a new builder, configure it with
/// the various methods, and call `.build()` to create the agent.
pub struct AgentBuilder {
    provider: Option<Arc<dyn ModelProvider>>,
    tools: Option<Arc<dyn ToolHandler>>,
    skills: Option<Arc<SkillRegistry>>,
    system_prompt: Option<String>,
    max_iterations: usize,
    max_tokens: u32,
    inference_timeout: Duration,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    /// Create a new AgentBuilder with default settings
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: None,
            skills: None,
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens: DEFAULT_MAX_TOKENS,
            inference_timeout: DEFAULT_INFERENCE_TIMEOUT,
        }
    }

    /// Use a model provider
    pub fn provider(mut self, provider: impl ModelProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Use an already shared provider
    pub fn provider_arc(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the handler that describes and runs tools
    ///
    /// Without one the model is offered no tools.
    pub fn tools(mut self, tools: impl ToolHandler + 'static) -> Self {
        self.tools = Some(Arc::new(tools));
        self
    }

    pub fn tools_arc(mut self, tools: Arc<dyn ToolHandler>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Enable inline `@name` skill invocation
    pub fn skills(mut self, skills: SkillRegistry) -> Self {
        self.skills = Some(Arc::new(skills));
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Ceiling on inference calls per run (default 10)
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Output token budget per inference call (default 8192)
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Bound on each inference call (default 120s)
    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    /// Build the agent
    ///
    /// Fails when no provider is configured or a limit is zero.
    pub fn build(self) -> Result<Agent, AgentError> {
        let provider = self.provider.ok_or_else(|| {
            AgentError::Configuration(
                "No provider configured. Call .provider() before .build()".to_string(),
            )
        })?;

        if self.max_iterations == 0 {
            return Err(AgentError::Configuration(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(AgentError::Configuration(
                "max_tokens must be at least 1".to_string(),
            ));
        }
        if self.inference_timeout.is_zero() {
            return Err(AgentError::Configuration(
                "inference timeout must be non-zero".to_string(),
            ));
        }

        Ok(Agent {
            provider,
            tools: self.tools.unwrap_or_else(|| Arc::new(NoTools)),
            skills: self.skills,
            system_prompt: self.system_prompt,
            max_iterations: self.max_iterations,
            max_tokens: self.max_tokens,
            inference_timeout: self.inference_timeout,
            hooks: Arc::new(parking_lot::RwLock::new(Vec::new())),
            next_hook_id: AtomicU64::new(0),
        })
    }
}

impl Agent {
    /// Create a new AgentBuilder for fluent configuration
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }
}
