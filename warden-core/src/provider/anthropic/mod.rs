//! Anthropic Messages API provider

mod conversion;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;

use super::{ModelProvider, ProviderError};
use crate::model::{ModelRequest, ModelResponse};
use conversion::{from_wire_response, WireRequest, WireResponse};

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";

/// Default API version
const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Default model id
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Default request timeout. The agent applies its own inference timeout on
/// top of this.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Clone)]
enum Credential {
    /// Sent as `x-api-key`
    ApiKey(String),
    /// Sent as `Authorization: Bearer`, for gateways that proxy the API
    AuthToken(String),
}

/// Anthropic direct API model provider
///
/// ```ignore
/// use warden_core::AnthropicProvider;
///
/// let provider = AnthropicProvider::builder()
///     .api_key(std::env::var("ANTHROPIC_API_KEY")?)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_base: String,
    api_version: String,
    credential: Credential,
    model_id: String,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_base", &self.api_base)
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}

impl AnthropicProvider {
    pub fn builder() -> AnthropicProviderBuilder {
        AnthropicProviderBuilder::default()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&self.api_version)
                .map_err(|e| ProviderError::Configuration(format!("Invalid API version: {}", e)))?,
        );
        match &self.credential {
            Credential::ApiKey(key) => {
                headers.insert(
                    "x-api-key",
                    HeaderValue::from_str(key).map_err(|_| {
                        ProviderError::Configuration("API key contains invalid characters".into())
                    })?,
                );
            }
            Credential::AuthToken(token) => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                        ProviderError::Configuration(
                            "Auth token contains invalid characters".into(),
                        )
                    })?,
                );
            }
        }
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.api_base);
        let body = WireRequest::new(&self.model_id, &request);

        tracing::debug!(
            model = %self.model_id,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending messages request"
        );

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(classify_transport_error)?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &text));
        }

        let parsed: WireResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Other(format!("Invalid response: {}", e)))?;
        Ok(from_wire_response(parsed))
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Network(format!("request timed out: {}", err))
    } else {
        ProviderError::Network(err.to_string())
    }
}

fn classify_status(status: u16, body: &str) -> ProviderError {
    let msg = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ if body.is_empty() => format!("HTTP {}", status),
        _ => body.to_string(),
    };

    match status {
        401 | 403 => ProviderError::Authentication(msg),
        429 => ProviderError::RateLimited(msg),
        500..=599 => ProviderError::ServiceUnavailable(msg),
        400 | 404 | 413 => ProviderError::Model(msg),
        _ => ProviderError::Other(msg),
    }
}

/// Builder for [`AnthropicProvider`]
#[derive(Debug, Default)]
pub struct AnthropicProviderBuilder {
    api_key: Option<String>,
    auth_token: Option<String>,
    api_base: Option<String>,
    api_version: Option<String>,
    model_id: Option<String>,
    timeout: Option<Duration>,
}

impl AnthropicProviderBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Use a bearer token instead of an API key.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the provider. An API key or auth token is required; the API key
    /// wins when both are set.
    pub fn build(self) -> Result<AnthropicProvider, ProviderError> {
        let credential = match (self.api_key, self.auth_token) {
            (Some(key), _) if !key.is_empty() => Credential::ApiKey(key),
            (_, Some(token)) if !token.is_empty() => Credential::AuthToken(token),
            _ => {
                return Err(ProviderError::Configuration(
                    "an API key or auth token is required".to_string(),
                ))
            }
        };

        let client = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let api_base = self
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(AnthropicProvider {
            client,
            api_base,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            credential,
            model_id: self.model_id.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, StopReason, ToolDefinition};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ModelRequest {
        ModelRequest {
            messages: vec![Message::user("list files")],
            system_prompt: Some("be careful".to_string()),
            max_tokens: 8192,
            tools: vec![ToolDefinition {
                name: "list_directory".to_string(),
                description: "List a directory".to_string(),
                input_schema: json!({"type": "object"}),
            }],
        }
    }

    #[test]
    fn test_builder_requires_credential() {
        let err = AnthropicProvider::builder().build().unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));

        let err = AnthropicProvider::builder().api_key("").build().unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(classify_status(401, ""), ProviderError::Authentication(_)));
        assert!(matches!(classify_status(429, ""), ProviderError::RateLimited(_)));
        assert!(matches!(classify_status(529, ""), ProviderError::ServiceUnavailable(_)));
        assert!(matches!(classify_status(418, ""), ProviderError::Other(_)));

        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad tools"}}"#;
        match classify_status(400, body) {
            ProviderError::Model(msg) => assert_eq!(msg, "bad tools"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "max_tokens": 8192,
                "system": "be careful"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "tool_use", "id": "tu_1", "name": "list_directory", "input": {"path": "."}}
                ],
                "stop_reason": "tool_use",
                "usage": {"input_tokens": 12, "output_tokens": 7}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AnthropicProvider::builder()
            .api_key("test-key")
            .base_url(format!("{}/", server.uri()))
            .model("test-model")
            .build()
            .unwrap();

        let response = provider.generate(request()).await.unwrap();
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.message.tool_uses()[0].id, "tu_1");
    }

    #[tokio::test]
    async fn test_generate_with_auth_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("authorization", "Bearer gateway-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "hello"}],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AnthropicProvider::builder()
            .auth_token("gateway-token")
            .base_url(server.uri())
            .build()
            .unwrap();

        let response = provider.generate(request()).await.unwrap();
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.message.text(), "hello");
        assert!(response.usage.is_none());
    }

    #[tokio::test]
    async fn test_generate_maps_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "type": "error",
                "error": {"type": "rate_limit_error", "message": "slow down"}
            })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::builder()
            .api_key("k")
            .base_url(server.uri())
            .build()
            .unwrap();

        match provider.generate(request()).await {
            Err(ProviderError::RateLimited(msg)) => assert_eq!(msg, "slow down"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
