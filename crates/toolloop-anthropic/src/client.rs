//! Anthropic Messages API client
//!
//! [`AnthropicClient`] implements [`CompletionClient`] by posting the request
//! to `/v1/messages`.
//!
//! # Error Handling
//!
//! | Failure | Error |
//! |---------|-------|
//! | Non-2xx status | `CompletionError::Api` with the decoded error body |
//! | Request timeout | `CompletionError::Timeout` |
//! | Undecodable success body | `CompletionError::Decode` |
//! | Anything else on the wire | `CompletionError::Transport` |
//!
//! The client does not retry. `CompletionError::is_retryable` tells callers
//! which failures are worth another attempt.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use toolloop_core::{
    CompletionClient, CompletionError, CompletionRequest, CompletionResponse, CompletionResult,
};
use tracing::{debug, warn};
use url::Url;

use crate::config::AnthropicConfig;
use crate::error::{AnthropicError, AnthropicResult, transport_error};

/// Relative to the base URL so a path prefix survives the join.
const MESSAGES_PATH: &str = "v1/messages";

/// HTTP client for the Anthropic Messages API
#[derive(Clone)]
pub struct AnthropicClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    api_version: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    /// Create a client from configuration
    pub fn new(config: AnthropicConfig) -> AnthropicResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("toolloop/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AnthropicError::HttpClient(e.to_string()))?;

        Self::with_http_client(config, http)
    }

    /// Create a client with a custom HTTP client
    pub fn with_http_client(config: AnthropicConfig, http: Client) -> AnthropicResult<Self> {
        let endpoint = config.base_url.join(MESSAGES_PATH)?;

        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key,
            api_version: config.api_version,
        })
    }

    /// Create a client configured from the environment
    pub fn from_env() -> AnthropicResult<Self> {
        Self::new(AnthropicConfig::from_env()?)
    }

    /// The messages endpoint requests are sent to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn create(&self, request: &CompletionRequest) -> CompletionResult<CompletionResponse> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "Sending completion request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_response(status, response).await);
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout(e.to_string())
            } else {
                CompletionError::Decode(e.to_string())
            }
        })?;

        debug!(
            stop_reason = ?completion.stop_reason,
            blocks = completion.content.len(),
            "Completion received"
        );
        Ok(completion)
    }
}

/// Turn a non-success response into an API error carrying the body.
async fn error_response(status: StatusCode, response: reqwest::Response) -> CompletionError {
    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "raw": text }));

    let error = CompletionError::api(status.as_u16(), body);
    warn!(status = status.as_u16(), error = %error, "Completion request failed");
    error
}
