//! Turn State Machine
//!
//! [`TurnMachine::advance`] is the transition function over [`Stage`]:
//!
//! - `pending`: one model call, then triage of the response
//! - `input_wait`: one tool call of the last response
//! - `ready`: terminal
//!
//! [`TurnMachine::run_turn`] applies it until the stage leaves `input_wait`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use toolloop_core::{
    CompletionClient, CompletionRequest, CompletionResponse, ContentBlock, Diagnostics,
    GenerationOptions, Message, StopReason, ToolChoice, ToolDescriptor, ToolUse,
};
use tracing::{debug, trace};

use crate::error::{Interrupted, TurnError};
use crate::invoker::ToolInvoker;
use crate::schema_error;
use crate::stage::{Stage, StageStatus};

/// The message-independent part of a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub model: String,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

impl TurnRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            options: GenerationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Whether a turn resolved the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The stage is `ready`.
    Done,
    /// Tool work is finished but another model call is needed.
    Continue,
}

/// Result of [`TurnMachine::run_turn`].
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub status: TurnStatus,
    pub stage: Stage,
}

impl TurnOutcome {
    pub fn is_done(&self) -> bool {
        self.status == TurnStatus::Done
    }

    /// The latest model response, if the turn made a model call.
    pub fn response(&self) -> Option<&CompletionResponse> {
        self.stage.response.as_ref()
    }
}

/// Drives stages with a completion client and a tool invoker.
#[derive(Clone)]
pub struct TurnMachine {
    client: Arc<dyn CompletionClient>,
    invoker: ToolInvoker,
    tools: Arc<[ToolDescriptor]>,
    tool_choice: ToolChoice,
    diagnostics: Arc<dyn Diagnostics>,
}

impl std::fmt::Debug for TurnMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnMachine")
            .field("tools", &self.tools.len())
            .field("tool_choice", &self.tool_choice)
            .finish_non_exhaustive()
    }
}

/// Owned copy of the tool call a stage points at.
struct CallSite {
    id: String,
    name: String,
    input: Value,
    next: Option<usize>,
}

impl TurnMachine {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        invoker: ToolInvoker,
        tools: Vec<ToolDescriptor>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            client,
            invoker,
            tools: tools.into(),
            tool_choice: ToolChoice::Auto,
            diagnostics,
        }
    }

    #[must_use]
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn tool_choice(&self) -> &ToolChoice {
        &self.tool_choice
    }

    /// A fresh `pending` stage for driving a turn step by step.
    pub fn begin(messages: Vec<Message>, index: usize) -> Stage {
        Stage::begin(messages, index)
    }

    /// Apply one transition.
    pub async fn advance(&self, request: &TurnRequest, stage: Stage) -> Result<Stage, Interrupted> {
        self.advance_with_cancel(request, stage, &CancellationToken::new())
            .await
    }

    /// Apply one transition under `cancel`.
    ///
    /// A cancelled token aborts a pending model call with
    /// [`TurnError::Cancelled`]; a tool call aborted by it becomes an error
    /// result like any other tool failure.
    pub async fn advance_with_cancel(
        &self,
        request: &TurnRequest,
        stage: Stage,
        cancel: &CancellationToken,
    ) -> Result<Stage, Interrupted> {
        trace!(status = %stage.status, index = stage.index, "Advancing stage");
        match stage.status {
            StageStatus::Pending { tool_call_index } => {
                self.on_pending(request, stage, tool_call_index, cancel)
                    .await
            }
            StageStatus::InputWait {
                tool_call_index,
                submessage_idx,
            } => {
                self.on_input_wait(stage, tool_call_index, submessage_idx, cancel)
                    .await
            }
            StageStatus::Ready => Err(Interrupted::new(
                stage,
                TurnError::InvalidStage("cannot advance a ready stage".to_string()),
            )),
        }
    }

    /// Run one turn from a fresh `pending` stage until it leaves `input_wait`.
    pub async fn run_turn(
        &self,
        request: &TurnRequest,
        messages: Vec<Message>,
        index: usize,
    ) -> Result<TurnOutcome, Interrupted> {
        self.run_turn_with_cancel(request, messages, index, &CancellationToken::new())
            .await
    }

    pub async fn run_turn_with_cancel(
        &self,
        request: &TurnRequest,
        messages: Vec<Message>,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, Interrupted> {
        let mut stage = Self::begin(messages, index);
        loop {
            stage = self.advance_with_cancel(request, stage, cancel).await?;
            if !stage.status.is_input_wait() {
                break;
            }
        }

        let status = if stage.is_ready() {
            TurnStatus::Done
        } else {
            TurnStatus::Continue
        };
        Ok(TurnOutcome { status, stage })
    }

    async fn on_pending(
        &self,
        request: &TurnRequest,
        mut stage: Stage,
        prior_tool_calls: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Stage, Interrupted> {
        if stage.index > stage.messages.len() {
            let reason = format!(
                "index {} is past the end of {} messages",
                stage.index,
                stage.messages.len()
            );
            return Err(Interrupted::new(stage, TurnError::InvalidStage(reason)));
        }

        let completion = CompletionRequest::new(
            request.model.clone(),
            stage.messages.clone(),
            &self.tools,
            self.tool_choice.clone(),
            request.options.clone(),
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(Interrupted::new(stage, TurnError::Cancelled));
            }
            result = self.client.create(&completion) => result,
        };
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let error = schema_error::classify(err, &self.tools);
                return Err(Interrupted::new(stage, error));
            }
        };

        stage.messages.push(response.to_message());
        self.report_new_messages(&mut stage);
        stage.messages.push(Message::placeholder());

        let first_tool_use = response.content.iter().position(ContentBlock::is_tool_use);
        stage.status = match first_tool_use {
            Some(submessage_idx) => {
                debug!(
                    tool_calls = response.content.iter().filter(|b| b.is_tool_use()).count(),
                    "Response requested tools"
                );
                StageStatus::InputWait {
                    tool_call_index: 0,
                    submessage_idx,
                }
            }
            None => {
                // An empty user message is never sent back to the model.
                stage.messages.pop();
                next_status_without_tools(response.stop_reason, prior_tool_calls)
            }
        };

        if stage.is_ready()
            && let Some(last) = stage.messages.last()
        {
            self.diagnostics.final_message(last, response.stop_reason);
        }

        stage.response = Some(response);
        Ok(stage)
    }

    async fn on_input_wait(
        &self,
        mut stage: Stage,
        tool_call_index: usize,
        submessage_idx: usize,
        cancel: &CancellationToken,
    ) -> Result<Stage, Interrupted> {
        let site = match call_site(&stage, submessage_idx) {
            Ok(site) => site,
            Err(reason) => return Err(Interrupted::new(stage, TurnError::InvalidStage(reason))),
        };

        let tool_use = ToolUse {
            id: &site.id,
            name: &site.name,
            input: &site.input,
        };
        let result = self.invoker.invoke(tool_use, cancel).await;

        let placeholder = stage.index;
        stage.messages[placeholder].content.push(result);

        let handled = tool_call_index + 1;
        stage.status = match site.next {
            Some(submessage_idx) => StageStatus::InputWait {
                tool_call_index: handled,
                submessage_idx,
            },
            None => {
                debug!(tool_calls = handled, "Tool calls complete");
                StageStatus::Pending {
                    tool_call_index: Some(handled),
                }
            }
        };
        Ok(stage)
    }

    fn report_new_messages(&self, stage: &mut Stage) {
        for (index, message) in stage.messages.iter().enumerate().skip(stage.index) {
            self.diagnostics.message(index, message);
        }
        stage.index = stage.messages.len();
    }
}

/// Status after a response that requested no tools.
///
/// An `end_turn` that follows tool calls made earlier in the same stage gets
/// one more model call; the count is consumed so the next `end_turn` is final.
fn next_status_without_tools(
    stop_reason: Option<StopReason>,
    prior_tool_calls: Option<usize>,
) -> StageStatus {
    match stop_reason {
        Some(StopReason::ToolUse) => StageStatus::Pending {
            tool_call_index: None,
        },
        Some(StopReason::EndTurn) if prior_tool_calls.is_some_and(|n| n > 0) => {
            StageStatus::Pending {
                tool_call_index: None,
            }
        }
        _ => StageStatus::Ready,
    }
}

fn call_site(stage: &Stage, submessage_idx: usize) -> Result<CallSite, String> {
    let index = stage.index;
    if index == 0 || index + 1 != stage.messages.len() {
        return Err(format!(
            "expected the tool result placeholder at {index} to be the last of {} messages",
            stage.messages.len()
        ));
    }

    let assistant = &stage.messages[index - 1];
    let tool_use = assistant
        .content
        .get(submessage_idx)
        .and_then(ContentBlock::as_tool_use)
        .ok_or_else(|| format!("block {submessage_idx} of message {} is not a tool_use", index - 1))?;

    let next = assistant
        .content
        .iter()
        .enumerate()
        .skip(submessage_idx + 1)
        .find(|(_, block)| block.is_tool_use())
        .map(|(position, _)| position);

    Ok(CallSite {
        id: tool_use.id.to_string(),
        name: tool_use.name.to_string(),
        input: tool_use.input.clone(),
        next,
    })
}
