//! Wiring of policy, tools, skills and agent for one interactive session

use std::sync::Arc;

use warden_core::policy::{
    AllowedCapabilities, CapabilityGate, FileWatcher, PolicyStore, PolicyWatcher,
};
use warden_core::{
    load_script_skills, Agent, AgentResponse, AnthropicProvider, Message, ModelProvider,
    RunOutcome, SkillRegistry,
};
use warden_tools::{ToolCatalog, ToolExecutor};

use crate::config::Config;
use crate::error::CliError;

/// A running assistant: the agent, the policy it is held to, and the one
/// conversation the terminal carries.
pub struct App {
    agent: Agent,
    store: Arc<PolicyStore>,
    gate: CapabilityGate,
    watcher: Option<FileWatcher>,
    history: Vec<Message>,
}

impl App {
    /// Build from configuration with the Anthropic provider.
    pub fn from_config(config: &Config) -> Result<Self, CliError> {
        config.validate()?;

        let mut builder = AnthropicProvider::builder().timeout(config.inference_timeout());
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            builder = builder.api_key(key);
        }
        if let Some(token) = config.auth_token.as_deref().filter(|t| !t.trim().is_empty()) {
            builder = builder.auth_token(token);
        }
        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(model) = &config.model {
            builder = builder.model(model);
        }

        Self::with_provider(config, Arc::new(builder.build()?))
    }

    /// Build around an existing provider. Credentials in `config` are not
    /// consulted.
    pub fn with_provider(
        config: &Config,
        provider: Arc<dyn ModelProvider>,
    ) -> Result<Self, CliError> {
        let store = Arc::new(PolicyStore::open(&config.permissions_file));
        let gate = CapabilityGate::new(store.clone());

        let mut skills = SkillRegistry::new(gate.clone());
        let loaded = load_script_skills(&config.skills_dir, &mut skills);
        tracing::info!(count = loaded, dir = %config.skills_dir.display(), "loaded skills");

        let agent = Agent::builder()
            .provider_arc(provider)
            .tools(ToolExecutor::with_gate(gate.clone()))
            .skills(skills)
            .with_system_prompt(config.system_prompt())
            .with_max_iterations(config.max_iterations)
            .with_max_tokens(config.max_tokens)
            .with_inference_timeout(config.inference_timeout())
            .build()?;

        let mut app = Self {
            agent,
            store,
            gate,
            watcher: None,
            history: Vec::new(),
        };
        if config.watch {
            app.start_watching();
        }
        Ok(app)
    }

    fn start_watching(&mut self) {
        let mut watcher = FileWatcher::new(self.store.clone());
        if watcher.start() {
            self.watcher = Some(watcher);
        } else {
            tracing::warn!("policy watching unavailable; use /reload after editing the policy");
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(|w| w.is_running())
    }

    /// Send one utterance, continuing the conversation so far.
    ///
    /// Only completed runs extend the conversation. A failed or truncated run
    /// leaves it as it was, so the next turn starts from a coherent state.
    pub async fn ask(&mut self, utterance: &str) -> AgentResponse {
        let response = self
            .agent
            .run_with_history(utterance, self.history.clone())
            .await;
        if response.outcome == RunOutcome::Completed {
            self.history = response.messages.clone();
        }
        response
    }

    /// Re-read the policy file now. Returns whether it loaded cleanly.
    pub fn reload_policy(&self) -> bool {
        self.store.reload()
    }

    pub fn allowed(&self) -> AllowedCapabilities {
        self.gate.list_allowed()
    }

    /// Names and descriptions of the tools the current policy offers.
    pub fn offered_tools(&self) -> Vec<(String, String)> {
        ToolCatalog::standard()
            .definitions_for(&self.gate)
            .into_iter()
            .map(|def| (def.name, def.description))
            .collect()
    }

    /// Forget the conversation.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Stop the watcher. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}
