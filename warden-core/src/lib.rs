//! # Warden
//!
//! Capability policy enforcement and a bounded agentic tool loop.
//!
//! Warden decides, from a hot-reloadable YAML policy file, which tools,
//! skills and MCP servers an AI agent may use, and runs the model/tool loop
//! with every tool call passing through that decision.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use warden_core::policy::{CapabilityGate, PolicyStore};
//! use warden_core::{Agent, AnthropicProvider};
//!
//! #[tokio::main]
//! async fn main() -> warden_core::Result<()> {
//!     let store = Arc::new(PolicyStore::open("permissions.yaml"));
//!     let gate = CapabilityGate::new(store);
//!
//!     let provider = AnthropicProvider::builder()
//!         .api_key(std::env::var("ANTHROPIC_API_KEY").unwrap_or_default())
//!         .build()?;
//!
//!     let agent = Agent::builder()
//!         .provider(provider)
//!         .tools(warden_tools::ToolExecutor::with_gate(gate))
//!         .build()?;
//!
//!     let response = agent.run("What files are in this directory?").await;
//!     println!("{}", response);
//!     Ok(())
//! }
//! ```
//!
//! ## Policy
//!
//! See the [`policy`] module for the document format and enforcement rules.
//! Capabilities are allowed only when an allow-list glob matches their name;
//! resource deny rules win over every allow.
//!
//! ## Feature Flags
//!
//! - `watch` - Reload the policy when its file changes (enabled by default)
//! - `anthropic` - Anthropic Messages API provider
//! - `test-utils` - Mock provider, tool handler and event collector

pub mod agent;
pub mod conversation;
pub mod error;
pub mod events;
pub mod model;
pub mod policy;
pub mod provider;
pub mod skill;
pub mod tool;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use agent::{
    Agent, AgentBuilder, AgentError, AgentResponse, RunOutcome, TokenUsageStats, ToolCallInfo,
    DEFAULT_INFERENCE_TIMEOUT, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOKENS,
};
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use events::{AgentEvent, AgentHook, HookId, TokenUsage};
pub use model::{ModelRequest, ModelResponse};

pub use policy::{
    CapabilityGate, CapabilityKind, PermissionCheck, PolicyDocument, PolicyError, PolicyStore,
    PolicyWatcher,
};

pub use provider::{ModelProvider, ProviderError};
#[cfg(feature = "anthropic")]
pub use provider::AnthropicProvider;

pub use skill::{load_script_skills, ScriptSkill, Skill, SkillError, SkillRegistry};
pub use tool::{ToolErrorKind, ToolHandler, ToolOutcome, ToolRequest};
pub use types::{
    ContentBlock, Message, Role, StopReason, ToolDefinition, ToolResultBlock, ToolResultStatus,
    ToolUseBlock,
};
