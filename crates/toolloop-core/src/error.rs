//! # Error Types
//!
//! Errors raised by the two external collaborators: the completion service
//! and the tool gateway. Neither type knows about the turn machine; the agent
//! crate decides which of them are recovered and which propagate.

use serde_json::Value;
use thiserror::Error;

/// Result type for completion requests.
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Result type for tool gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A failed completion request.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// The service answered with a non-success status.
    ///
    /// `body` is the decoded error body, typically
    /// `{"type": "error", "error": {"type": …, "message": …}}`.
    #[error("Completion API error (HTTP {status}): {}", api_message(.body))]
    Api { status: u16, body: Value },

    /// The request never reached the service or the connection dropped.
    #[error("Completion transport error: {0}")]
    Transport(String),

    /// The service answered but the body could not be decoded.
    #[error("Completion response could not be decoded: {0}")]
    Decode(String),

    /// The request did not finish in time.
    #[error("Completion request timed out: {0}")]
    Timeout(String),
}

impl CompletionError {
    /// Create an API error from a status code and error body.
    pub fn api(status: u16, body: Value) -> Self {
        CompletionError::Api { status, body }
    }

    /// The nested service error object, if any (`body.error`).
    pub fn service_error(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            CompletionError::Api { body, .. } => body.get("error")?.as_object(),
            _ => None,
        }
    }

    /// The service-reported error kind (`body.error.type`).
    pub fn service_error_type(&self) -> Option<&str> {
        self.service_error()?.get("type")?.as_str()
    }

    /// The service-reported message (`body.error.message`).
    pub fn service_error_message(&self) -> Option<&str> {
        self.service_error()?.get("message")?.as_str()
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Api { status, .. } => *status == 429 || *status >= 500,
            CompletionError::Transport(_) | CompletionError::Timeout(_) => true,
            CompletionError::Decode(_) => false,
        }
    }

    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            CompletionError::Api { .. } => "COMPLETION_API_ERROR",
            CompletionError::Transport(_) => "COMPLETION_TRANSPORT_ERROR",
            CompletionError::Decode(_) => "COMPLETION_DECODE_ERROR",
            CompletionError::Timeout(_) => "COMPLETION_TIMEOUT",
        }
    }
}

fn api_message(body: &Value) -> String {
    body.get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

/// A failed tool gateway operation.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The tool ran and reported an error result.
    #[error("Tool reported an error: {0}")]
    ToolReported(String),

    /// The gateway does not know the tool.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The gateway rejected the arguments.
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    /// The connection to the gateway failed.
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// The gateway answered with something unexpected.
    #[error("Gateway protocol error: {0}")]
    Protocol(String),

    /// The call was cancelled before it finished.
    #[error("Tool call cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Transport(_))
    }

    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::ToolReported(_) => "TOOL_REPORTED_ERROR",
            GatewayError::ToolNotFound(_) => "TOOL_NOT_FOUND",
            GatewayError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            GatewayError::Transport(_) => "GATEWAY_TRANSPORT_ERROR",
            GatewayError::Protocol(_) => "GATEWAY_PROTOCOL_ERROR",
            GatewayError::Cancelled => "CANCELLED",
        }
    }
}

/// Render an error and its `source()` chain, one cause per line.
///
/// Rust errors carry no stack trace; the cause chain is the closest
/// equivalent and is what diagnostics report as the failure's stack.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut lines = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }
    lines.join("\n")
}
