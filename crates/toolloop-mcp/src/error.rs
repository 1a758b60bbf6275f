//! MCP error types
//!
//! Errors raised while bootstrapping or talking to an MCP tool session, and
//! their mapping onto the gateway errors the driver understands.

use thiserror::Error;
use toolloop_core::GatewayError;

/// MCP operation result type
pub type McpResult<T> = Result<T, McpError>;

/// Errors that can occur during MCP operations
#[derive(Debug, Error)]
pub enum McpError {
    /// The bootstrap options are unusable
    #[error("Invalid session bootstrap: {0}")]
    InvalidBootstrap(String),

    /// The gateway process could not be started
    #[error("Failed to spawn MCP gateway: {0}")]
    Spawn(#[from] std::io::Error),

    /// The MCP handshake failed
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Connection closed
    #[error("Connection closed")]
    ConnectionClosed,

    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid tool parameters
    #[error("Invalid tool parameters: {0}")]
    InvalidParameters(String),

    /// Tool operation timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// MCP protocol error
    #[error("MCP protocol error: {0}")]
    ProtocolError(String),

    /// Client error
    #[error("Client error: {0}")]
    ClientError(String),
}

impl McpError {
    /// Map onto the error a [`ToolGateway`](toolloop_core::ToolGateway) reports.
    pub fn to_gateway_error(&self) -> GatewayError {
        match self {
            McpError::ToolNotFound(tool) => GatewayError::ToolNotFound(tool.clone()),
            McpError::InvalidParameters(msg) => GatewayError::InvalidArguments(msg.clone()),
            McpError::ProtocolError(msg) | McpError::ClientError(msg) => {
                GatewayError::Protocol(msg.clone())
            }
            McpError::InvalidBootstrap(_)
            | McpError::Spawn(_)
            | McpError::ConnectionError(_)
            | McpError::ConnectionClosed
            | McpError::Timeout(_) => GatewayError::Transport(self.to_string()),
        }
    }

    /// Check if this error is retryable
    ///
    /// Returns true for transient errors that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, McpError::ConnectionError(_) | McpError::Timeout(_))
    }

    /// Check if this error indicates the session is unusable
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            McpError::ConnectionClosed | McpError::ProtocolError(_) | McpError::Spawn(_)
        )
    }

    /// Create an error from an rmcp error message
    pub fn from_rmcp_error(error: impl std::fmt::Display) -> Self {
        let msg = error.to_string();

        if msg.contains("not found") || msg.contains("NotFound") {
            McpError::ToolNotFound(msg)
        } else if msg.contains("invalid") || msg.contains("Invalid") {
            McpError::InvalidParameters(msg)
        } else if msg.contains("timeout") || msg.contains("Timeout") {
            McpError::Timeout(msg)
        } else if msg.contains("closed") || msg.contains("Closed") {
            McpError::ConnectionClosed
        } else {
            McpError::ClientError(msg)
        }
    }
}

impl From<McpError> for GatewayError {
    fn from(error: McpError) -> Self {
        error.to_gateway_error()
    }
}
