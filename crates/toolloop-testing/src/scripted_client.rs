//! A completion client that replays a script.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use toolloop_core::{
    CompletionClient, CompletionError, CompletionRequest, CompletionResponse, CompletionResult,
};

use crate::lock;

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Respond(CompletionResponse),
    Fail(CompletionError),
    /// Never answer
    Hang,
}

/// Replays its script in order, one step per request.
///
/// Requests beyond the end of the script fail with a transport error so a
/// test that makes an unexpected call fails loudly.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCompletionClient {
    script: Arc<Mutex<VecDeque<ScriptStep>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(self, response: CompletionResponse) -> Self {
        self.push(ScriptStep::Respond(response))
    }

    #[must_use]
    pub fn with_error(self, error: CompletionError) -> Self {
        self.push(ScriptStep::Fail(error))
    }

    #[must_use]
    pub fn with_hang(self) -> Self {
        self.push(ScriptStep::Hang)
    }

    fn push(self, step: ScriptStep) -> Self {
        lock(&self.script).push_back(step);
        self
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Steps not yet consumed
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn create(&self, request: &CompletionRequest) -> CompletionResult<CompletionResponse> {
        lock(&self.requests).push(request.clone());
        let step = lock(&self.script).pop_front();

        match step {
            Some(ScriptStep::Respond(response)) => Ok(response),
            Some(ScriptStep::Fail(error)) => Err(error),
            Some(ScriptStep::Hang) => std::future::pending().await,
            None => Err(CompletionError::Transport("script exhausted".to_string())),
        }
    }
}
