//! # Toolloop Testing
//!
//! Predictable stand-ins for the two external services a conversation driver
//! talks to, plus a diagnostics sink that records what it was told.
//!
//! ## Components
//!
//! - **[`MockGateway`]**: a [`ToolGateway`](toolloop_core::ToolGateway) with a
//!   fixed catalog and per-tool behaviours
//! - **[`ScriptedCompletionClient`]**: a
//!   [`CompletionClient`](toolloop_core::CompletionClient) that replays a
//!   script of responses and errors
//! - **[`RecordingDiagnostics`]**: captures every diagnostics event
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use toolloop_core::{CatalogEntry, CompletionResponse};
//! use toolloop_testing::{MockGateway, MockToolBehavior, ScriptedCompletionClient};
//!
//! let gateway = MockGateway::new()
//!     .with_tool(CatalogEntry::new("add", json!({"type": "object"})))
//!     .with_behavior("add", MockToolBehavior::Respond(json!({"type": "text", "text": "4"})));
//! let client = ScriptedCompletionClient::new().with_response(CompletionResponse::text("4"));
//!
//! assert_eq!(gateway.call_count(), 0);
//! assert_eq!(client.request_count(), 0);
//! ```

/// Recording diagnostics sink
pub mod diagnostics;
/// Mock tool gateway
pub mod mock_gateway;
/// Scripted completion client
pub mod scripted_client;

pub use diagnostics::{DiagnosticEvent, RecordingDiagnostics};
pub use mock_gateway::{MockGateway, MockToolBehavior};
pub use scripted_client::{ScriptStep, ScriptedCompletionClient};

use std::sync::{Mutex, MutexGuard};

/// Lock shared mock state. A panicking test must not hide later assertions.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
