//! Top-level error types for warden
//!
//! This module provides a simplified, user-facing error type that flattens
//! the internal error hierarchy into actionable categories.

use thiserror::Error;

use crate::agent::AgentError;
use crate::policy::PolicyError;
use crate::provider::ProviderError;
use crate::skill::SkillError;

/// Top-level error type for warden operations
///
/// - [`Error::Auth`] - Fix credentials and retry
/// - [`Error::RateLimited`] - Back off and retry
/// - [`Error::Network`] - Check connectivity, retry
/// - [`Error::Unavailable`] - Service is down, wait and retry
/// - [`Error::Timeout`] - Inference took too long
/// - [`Error::Policy`] - The policy file could not be used
/// - [`Error::Config`] - Fix configuration
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication failed (invalid or expired credentials)
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limited - slow down requests
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network connectivity issue
    #[error("network error: {0}")]
    Network(String),

    /// Service temporarily unavailable
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Model error (content filtered, context too long, etc.)
    #[error("model error: {0}")]
    Model(String),

    /// An inference call exceeded its timeout
    #[error("timed out: {0}")]
    Timeout(String),

    /// Policy file missing, unreadable or malformed
    #[error("policy error: {0}")]
    Policy(String),

    /// A skill failed to run
    #[error("skill error: {0}")]
    Skill(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true if this is an authentication error
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Returns true if this is a rate limiting error
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Returns true if retrying later might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Network(_) | Self::Unavailable(_) | Self::Timeout(_)
        )
    }
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Authentication(msg) => Self::Auth(msg),
            ProviderError::RateLimited(msg) => Self::RateLimited(msg),
            ProviderError::Network(msg) => Self::Network(msg),
            ProviderError::Model(msg) => Self::Model(msg),
            ProviderError::ServiceUnavailable(msg) => Self::Unavailable(msg),
            ProviderError::Configuration(msg) => Self::Config(msg),
            ProviderError::Other(msg) => Self::Other(msg),
        }
    }
}

impl From<AgentError> for Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Provider(e) => e.into(),
            AgentError::InferenceTimeout(d) => Self::Timeout(format!("inference after {:?}", d)),
            AgentError::Configuration(msg) => Self::Config(msg),
        }
    }
}

impl From<PolicyError> for Error {
    fn from(err: PolicyError) -> Self {
        Self::Policy(err.to_string())
    }
}

impl From<SkillError> for Error {
    fn from(err: SkillError) -> Self {
        Self::Skill(err.to_string())
    }
}

/// Result type alias for warden operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_provider_errors_flatten() {
        let err: Error = ProviderError::Authentication("bad key".into()).into();
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "authentication failed: bad key");

        let err: Error = ProviderError::RateLimited("429".into()).into();
        assert!(err.is_rate_limited());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_agent_errors_flatten() {
        let err: Error = AgentError::Provider(ProviderError::Network("reset".into())).into();
        assert!(matches!(err, Error::Network(_)));

        let err: Error = AgentError::InferenceTimeout(Duration::from_secs(120)).into();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.is_retryable());

        let err: Error = AgentError::Configuration("no provider".into()).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_policy_errors_flatten() {
        let err: Error = PolicyError::Empty.into();
        assert!(matches!(err, Error::Policy(_)));
    }
}
