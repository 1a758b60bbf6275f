//! A diagnostics sink that keeps every event for later assertions.

use std::sync::{Arc, Mutex};

use toolloop_core::{Diagnostics, Message, StopReason, ToolFailure};

use crate::lock;

/// One recorded diagnostics event
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    Message { index: usize, message: Message },
    ToolFailure(ToolFailure),
    FinalMessage {
        message: Message,
        stop_reason: Option<StopReason>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    events: Arc<Mutex<Vec<DiagnosticEvent>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in emission order
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        lock(&self.events).clone()
    }

    /// Indices of reported messages, in emission order
    pub fn message_indices(&self) -> Vec<usize> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                DiagnosticEvent::Message { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    pub fn tool_failures(&self) -> Vec<ToolFailure> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                DiagnosticEvent::ToolFailure(failure) => Some(failure.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn final_messages(&self) -> Vec<(Message, Option<StopReason>)> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                DiagnosticEvent::FinalMessage {
                    message,
                    stop_reason,
                } => Some((message.clone(), *stop_reason)),
                _ => None,
            })
            .collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn message(&self, index: usize, message: &Message) {
        lock(&self.events).push(DiagnosticEvent::Message {
            index,
            message: message.clone(),
        });
    }

    fn tool_failure(&self, failure: &ToolFailure) {
        lock(&self.events).push(DiagnosticEvent::ToolFailure(failure.clone()));
    }

    fn final_message(&self, message: &Message, stop_reason: Option<StopReason>) {
        lock(&self.events).push(DiagnosticEvent::FinalMessage {
            message: message.clone(),
            stop_reason,
        });
    }
}
