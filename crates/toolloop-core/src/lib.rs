//! # Toolloop Core
//!
//! Core types and collaborator traits for the toolloop conversation driver.
//!
//! - [`message`]: conversation messages and content blocks
//! - [`completion`]: completion requests, responses and the [`CompletionClient`] trait
//! - [`tool`]: tool descriptors, catalog entries and the `tools/call` shapes
//! - [`gateway`]: the [`ToolGateway`] trait
//! - [`diagnostics`]: observational events and the [`Diagnostics`] trait

pub mod completion;
pub mod diagnostics;
pub mod error;
pub mod gateway;
pub mod message;
pub mod tool;

pub use completion::{
    CompletionClient, CompletionRequest, CompletionResponse, GenerationOptions, StopReason, Usage,
};
pub use diagnostics::{Diagnostics, NoopDiagnostics, ToolFailure, TracingDiagnostics};
pub use error::{CompletionError, CompletionResult, GatewayError, GatewayResult, error_chain};
pub use gateway::ToolGateway;
pub use message::{ContentBlock, Message, Role, ToolUse};
pub use tool::{
    CatalogEntry, TOOLS_CALL_METHOD, ToolChoice, ToolDescriptor, ToolInvocation, ToolOutput,
};

pub use tokio_util::sync::CancellationToken;
