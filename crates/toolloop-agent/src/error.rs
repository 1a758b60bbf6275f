//! Error types for the turn machine and driver.

use thiserror::Error;
use toolloop_core::{CompletionError, GatewayError};

use crate::config::ConfigError;
use crate::stage::Stage;

/// Errors that stop a conversation.
///
/// Tool failures never appear here: they are turned into error results and
/// handed back to the model.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The completion request failed.
    #[error(transparent)]
    Completion(CompletionError),

    /// The completion service rejected a tool's input schema.
    #[error("Invalid input schema for tool '{tool_name}' (tools.{tool_index})")]
    ToolSchema {
        tool_index: usize,
        tool_name: String,
        #[source]
        source: CompletionError,
    },

    /// The tool catalog could not be fetched.
    #[error("Failed to fetch tool catalog: {0}")]
    Catalog(#[source] GatewayError),

    /// A transition met a stage that breaks the machine's invariants.
    #[error("Invalid stage: {0}")]
    InvalidStage(String),

    /// The caller cancelled the conversation.
    #[error("Conversation cancelled")]
    Cancelled,

    /// The conversation needed more turns than configured.
    #[error("Turn limit of {0} exceeded")]
    TurnLimitExceeded(usize),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A required builder component was not supplied.
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),

    /// The MCP session could not be established.
    #[cfg(feature = "mcp")]
    #[error("MCP session error: {0}")]
    Session(#[from] toolloop_mcp::McpError),
}

impl TurnError {
    /// Check if retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TurnError::Completion(err) => err.is_retryable(),
            TurnError::Catalog(err) => err.is_retryable(),
            #[cfg(feature = "mcp")]
            TurnError::Session(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            TurnError::Completion(err) => err.error_code(),
            TurnError::ToolSchema { .. } => "TOOL_SCHEMA_ERROR",
            TurnError::Catalog(_) => "CATALOG_ERROR",
            TurnError::InvalidStage(_) => "INVALID_STAGE",
            TurnError::Cancelled => "CANCELLED",
            TurnError::TurnLimitExceeded(_) => "TURN_LIMIT_EXCEEDED",
            TurnError::Config(_) => "CONFIG_ERROR",
            TurnError::MissingComponent(_) => "MISSING_COMPONENT",
            #[cfg(feature = "mcp")]
            TurnError::Session(_) => "MCP_SESSION_ERROR",
        }
    }

    /// The tool index and name of a schema error.
    pub fn tool_schema(&self) -> Option<(usize, &str)> {
        match self {
            TurnError::ToolSchema {
                tool_index,
                tool_name,
                ..
            } => Some((*tool_index, tool_name)),
            _ => None,
        }
    }
}

/// Result type for turn operations.
pub type TurnResult<T> = Result<T, TurnError>;

/// A transition that failed, with the stage it was given.
///
/// The stage is handed back untouched so the caller keeps ownership of the
/// conversation even when a step fails.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Interrupted {
    pub stage: Box<Stage>,
    #[source]
    pub error: TurnError,
}

impl Interrupted {
    pub fn new(stage: Stage, error: TurnError) -> Self {
        Self {
            stage: Box::new(stage),
            error,
        }
    }

    /// Split into the stage and the error.
    pub fn into_parts(self) -> (Stage, TurnError) {
        (*self.stage, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_schema_display_and_source() {
        let err = TurnError::ToolSchema {
            tool_index: 2,
            tool_name: "search".to_string(),
            source: CompletionError::api(400, json!({})),
        };
        assert_eq!(
            err.to_string(),
            "Invalid input schema for tool 'search' (tools.2)"
        );
        assert_eq!(err.tool_schema(), Some((2, "search")));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.error_code(), "TOOL_SCHEMA_ERROR");
    }

    #[test]
    fn test_completion_error_is_transparent() {
        let inner = CompletionError::Transport("reset".to_string());
        let err = TurnError::Completion(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
        assert!(err.is_retryable());
        assert!(err.tool_schema().is_none());
    }

    #[test]
    fn test_interrupted_returns_stage() {
        let stage = Stage::begin(vec![toolloop_core::Message::user("hi")], 0);
        let interrupted = Interrupted::new(stage.clone(), TurnError::Cancelled);
        assert_eq!(interrupted.to_string(), "Conversation cancelled");

        let (returned, error) = interrupted.into_parts();
        assert_eq!(returned, stage);
        assert!(matches!(error, TurnError::Cancelled));
    }
}
