//! The resumable state record of one turn.
//!
//! A [`Stage`] is created fresh per turn and moved through
//! [`TurnMachine::advance`](crate::machine::TurnMachine::advance) by value.
//! It owns the conversation while the turn runs and is serialisable, so a turn
//! can be parked between steps and resumed later.

use serde::{Deserialize, Serialize};
use toolloop_core::{CompletionResponse, Message};

/// Where a turn currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    /// A model call is due. `tool_call_index` counts the tool calls handled in
    /// the previous cycle of this turn, if any.
    Pending {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_index: Option<usize>,
    },
    /// Tool calls of the last response are being executed.
    InputWait {
        /// Ordinal of the current call among the response's tool use blocks
        tool_call_index: usize,
        /// Position of the current call in the response's content
        submessage_idx: usize,
    },
    /// The turn is resolved.
    Ready,
}

impl StageStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, StageStatus::Pending { .. })
    }

    pub fn is_input_wait(&self) -> bool {
        matches!(self, StageStatus::InputWait { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, StageStatus::Ready)
    }

    /// Short name, as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            StageStatus::Pending { .. } => "pending",
            StageStatus::InputWait { .. } => "input_wait",
            StageStatus::Ready => "ready",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// State of a turn between two steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// The latest model response of this turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<CompletionResponse>,
    /// The conversation
    pub messages: Vec<Message>,
    /// Messages before this position have been reported to diagnostics
    pub index: usize,
    #[serde(flatten)]
    pub status: StageStatus,
}

impl Stage {
    /// A fresh `pending` stage over `messages`, with `index` messages already reported.
    pub fn begin(messages: Vec<Message>, index: usize) -> Self {
        Self {
            response: None,
            messages,
            index,
            status: StageStatus::Pending {
                tool_call_index: None,
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status.is_ready()
    }

    /// Give the conversation back.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
