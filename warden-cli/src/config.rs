//! Process configuration from flags and environment variables

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use warden_core::{DEFAULT_INFERENCE_TIMEOUT, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOKENS};

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant running on the user's \
machine. You can run shell commands and read, write and list files, but only the tools you \
are offered are permitted. If a tool reports a permission error, explain that the action is \
not allowed instead of retrying it.";

/// Errors in the process configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no Anthropic credentials: set ANTHROPIC_API_KEY or ANTHROPIC_AUTH_TOKEN")]
    MissingCredentials,

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

/// warden: a policy-gated assistant for the terminal
#[derive(Debug, Clone, Parser)]
#[command(name = "warden", version, about, long_about = None)]
pub struct Config {
    /// Capability policy file
    #[arg(
        long,
        env = "PERMISSIONS_FILE",
        default_value = "./permissions.yaml",
        value_name = "FILE"
    )]
    pub permissions_file: PathBuf,

    /// Directory of executable skill scripts
    #[arg(long, env = "SKILLS_DIR", default_value = "./skills", value_name = "DIR")]
    pub skills_dir: PathBuf,

    /// Reload the policy whenever its file changes
    #[arg(long, env = "WARDEN_WATCH")]
    pub watch: bool,

    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Bearer token, used when no API key is set
    #[arg(long, env = "ANTHROPIC_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Messages API base URL
    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    pub base_url: Option<String>,

    /// Model identifier
    #[arg(long, env = "ANTHROPIC_MODEL")]
    pub model: Option<String>,

    /// Model calls allowed per request
    #[arg(long, env = "WARDEN_MAX_ITERATIONS", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Token limit per model response
    #[arg(long, env = "WARDEN_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Seconds to wait for one model response
    #[arg(
        long,
        env = "WARDEN_INFERENCE_TIMEOUT",
        default_value_t = DEFAULT_INFERENCE_TIMEOUT.as_secs()
    )]
    pub inference_timeout: u64,

    /// Override the system prompt
    #[arg(long, env = "WARDEN_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, env = "WARDEN_LOG", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "WARDEN_LOG_JSON")]
    pub json_logs: bool,
}

impl Config {
    /// Check the values clap cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Zero {
                name: "max iterations",
            });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Zero { name: "max tokens" });
        }
        if self.inference_timeout == 0 {
            return Err(ConfigError::Zero {
                name: "inference timeout",
            });
        }
        if !has_value(&self.api_key) && !has_value(&self.auth_token) {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout)
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

fn has_value(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
