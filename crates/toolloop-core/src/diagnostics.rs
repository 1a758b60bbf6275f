//! Diagnostics events emitted while a conversation is driven.
//!
//! These are observational only; nothing in the turn machine depends on
//! whether a sink records them.

use serde::Serialize;
use tracing::{info, warn};

use crate::completion::StopReason;
use crate::message::Message;

/// Target used by [`TracingDiagnostics`] events.
pub const DIAGNOSTICS_TARGET: &str = "toolloop::diagnostics";

/// A tool call that failed and was turned into an error result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFailure {
    pub tool_use_id: String,
    pub name: String,
    pub message: String,
    pub stack: String,
}

/// Receiver of diagnostics events.
pub trait Diagnostics: Send + Sync {
    /// A message was appended to the conversation. `index` is its position.
    fn message(&self, index: usize, message: &Message);

    /// A tool call failed.
    fn tool_failure(&self, failure: &ToolFailure);

    /// The turn finished with `message` as its final answer.
    fn final_message(&self, message: &Message, stop_reason: Option<StopReason>);
}

/// Default sink: structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn message(&self, index: usize, message: &Message) {
        let content = serde_json::to_string(&message.content).unwrap_or_default();
        info!(
            target: DIAGNOSTICS_TARGET,
            event = "message",
            index,
            role = %message.role,
            content = %content,
            "Conversation message"
        );
    }

    fn tool_failure(&self, failure: &ToolFailure) {
        warn!(
            target: DIAGNOSTICS_TARGET,
            event = "tool_failure",
            tool_use_id = %failure.tool_use_id,
            name = %failure.name,
            error = %failure.message,
            stack = %failure.stack,
            "Tool execution failed"
        );
    }

    fn final_message(&self, message: &Message, stop_reason: Option<StopReason>) {
        info!(
            target: DIAGNOSTICS_TARGET,
            event = "final_message",
            role = %message.role,
            stop_reason = ?stop_reason,
            text = %message.text_content(),
            "Turn finished"
        );
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn message(&self, _index: usize, _message: &Message) {}

    fn tool_failure(&self, _failure: &ToolFailure) {}

    fn final_message(&self, _message: &Message, _stop_reason: Option<StopReason>) {}
}
