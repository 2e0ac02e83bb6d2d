//! CLI-specific error types

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid process configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Agent could not be assembled
    #[error("Agent error: {0}")]
    Agent(#[from] warden_core::AgentError),

    /// Inference provider could not be created
    #[error("Provider error: {0}")]
    Provider(#[from] warden_core::ProviderError),

    /// Readline/input error
    #[error("Input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// IO error (filesystem, stdout, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tracing subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}
