//! Anthropic client error types
//!
//! Setup errors live here. Errors of individual requests are reported as
//! [`CompletionError`] so the driver can classify them.

use thiserror::Error;
use toolloop_core::CompletionError;

/// Result type for client setup
pub type AnthropicResult<T> = Result<T, AnthropicError>;

/// Errors that can occur while configuring the client
#[derive(Debug, Error)]
pub enum AnthropicError {
    /// No API key was configured
    #[error("Missing API key: set ANTHROPIC_API_KEY")]
    MissingApiKey,

    /// Invalid environment variable value
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    /// Invalid base URL
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
}

/// Map a `reqwest` failure onto the completion error it represents.
pub(crate) fn transport_error(error: reqwest::Error) -> CompletionError {
    if error.is_timeout() {
        CompletionError::Timeout(error.to_string())
    } else if error.is_decode() {
        CompletionError::Decode(error.to_string())
    } else {
        CompletionError::Transport(error.to_string())
    }
}
