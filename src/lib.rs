//! # Toolloop
//!
//! Toolloop drives tool-using conversations with an LLM completion service.
//! The model proposes tool calls, toolloop runs them through a tool gateway
//! and feeds the results back until the model produces a final answer.
//!
//! ## Core Components
//!
//! - **[Driver]**: completes a conversation end to end
//! - **[TurnMachine]**: the resumable turn state machine behind the driver
//! - **[ToolInvoker]**: runs one tool call and turns any failure into an error result
//! - **[classify]**: recognises rejected tool input schemas in API errors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "mcp", feature = "anthropic"))]
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use toolloop::{AnthropicClient, Driver, DriverConfig, Message, SessionBootstrap, SessionOptions};
//!
//! let driver = Driver::builder()
//!     .client(Arc::new(AnthropicClient::from_env()?))
//!     .session(SessionBootstrap::new("sess-1", SessionOptions::new("tool-gateway")))
//!     .config(DriverConfig::from_env()?)
//!     .build()
//!     .await?;
//!
//! let mut body = driver.body(vec![Message::user("What is 2+2?")]);
//! let response = driver.create_message(&mut body).await?;
//! println!("{}", response.text_content());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `mcp` (default): MCP tool sessions bootstrapped from a child process
//! - `anthropic` (default): HTTP client for the Anthropic Messages API
//! - `observability`: global `tracing` subscriber setup
//! - `testing`: scripted clients and mock gateways

// ============================================================================
// Module aliases for namespaced access
// ============================================================================

pub use toolloop_agent as agent;
pub use toolloop_core as core;

#[cfg(feature = "mcp")]
pub use toolloop_mcp as mcp;

#[cfg(feature = "anthropic")]
pub use toolloop_anthropic as anthropic;

#[cfg(feature = "observability")]
pub use toolloop_observability as observability;

#[cfg(feature = "testing")]
pub use toolloop_testing as testing;

// ============================================================================
// Data model and collaborator traits
// ============================================================================

pub use toolloop_core::{
    CancellationToken, CatalogEntry, CompletionClient, CompletionError, CompletionRequest,
    CompletionResponse, ContentBlock, Diagnostics, GatewayError, GenerationOptions, Message,
    NoopDiagnostics, Role, StopReason, ToolChoice, ToolDescriptor, ToolFailure, ToolGateway,
    ToolInvocation, ToolOutput, TracingDiagnostics,
};

// ============================================================================
// Conversation driving
// ============================================================================

pub use toolloop_agent::{
    ConfigError, Driver, DriverBuilder, DriverConfig, Interrupted, MessageBody, Stage, StageStatus,
    ToolInvoker, TurnError, TurnMachine, TurnOutcome, TurnRequest, TurnResult, TurnStatus,
    classify, normalize_content,
};

// ============================================================================
// Concrete collaborators
// ============================================================================

#[cfg(feature = "mcp")]
pub use toolloop_mcp::{McpError, McpSession, SessionBootstrap, SessionOptions};

#[cfg(feature = "anthropic")]
pub use toolloop_anthropic::{AnthropicClient, AnthropicConfig, AnthropicError};

#[cfg(feature = "observability")]
pub use toolloop_observability::{LogFormat, ObservabilityConfig, init_tracing};
