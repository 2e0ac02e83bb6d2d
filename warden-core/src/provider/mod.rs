//! Model providers for LLM interactions
//!
//! This module contains the `ModelProvider` trait the agent loop calls for
//! inference, and the optional Anthropic Messages API implementation.

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;

pub use crate::model::{ModelRequest, ModelResponse};

/// Error types for model providers
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Authentication or authorization failed (expired tokens, invalid credentials, etc.)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting or throttling
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network or connectivity issues
    #[error("Network error: {0}")]
    Network(String),

    /// Model-specific errors (content filtered, context too long, etc.)
    #[error("Model error: {0}")]
    Model(String),

    /// Service unavailable or temporary issues
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Invalid configuration (bad model ID, missing parameters, etc.)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Other provider-specific errors that don't fit above categories
    #[error("{0}")]
    Other(String),
}

/// Trait for model providers
///
/// The agent loop is written against this trait only; it never talks to an
/// HTTP API directly. Tests script it with
/// [`MockProvider`](crate::test_utils::MockProvider).
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    /// Get the model name for display
    fn name(&self) -> &str;

    /// Send a request to the model and get a response
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError>;
}

// Implement ModelProvider for Arc<dyn ModelProvider> to support dynamic dispatch
#[async_trait::async_trait]
impl ModelProvider for std::sync::Arc<dyn ModelProvider> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError> {
        (**self).generate(request).await
    }
}
