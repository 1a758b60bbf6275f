//! Driver facade: completes a conversation by running turns until the model
//! gives a final answer.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use toolloop_core::{
    CompletionClient, CompletionResponse, Diagnostics, GenerationOptions, Message, ToolDescriptor,
    ToolGateway, TracingDiagnostics,
};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::DriverConfig;
use crate::error::{TurnError, TurnResult};
use crate::invoker::ToolInvoker;
use crate::machine::{TurnMachine, TurnOutcome, TurnRequest, TurnStatus};

#[cfg(feature = "mcp")]
use toolloop_mcp::{McpSession, SessionBootstrap};

/// A conversation to complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

impl MessageBody {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: GenerationOptions::default(),
        }
    }

    /// The body without its messages.
    pub fn turn_request(&self) -> TurnRequest {
        TurnRequest {
            model: self.model.clone(),
            options: self.options.clone(),
        }
    }
}

/// Runs conversations against one completion client and one tool session.
pub struct Driver {
    machine: TurnMachine,
    gateway: Arc<dyn ToolGateway>,
    config: DriverConfig,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("machine", &self.machine)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Driver {
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    /// The tool catalog sent with every completion request.
    pub fn tools(&self) -> &[ToolDescriptor] {
        self.machine.tools()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn machine(&self) -> &TurnMachine {
        &self.machine
    }

    pub fn gateway(&self) -> &Arc<dyn ToolGateway> {
        &self.gateway
    }

    /// A body over `messages` using the configured model and options.
    pub fn body(&self, messages: Vec<Message>) -> MessageBody {
        MessageBody {
            model: self.config.model.clone(),
            messages,
            options: self.config.generation_options(),
        }
    }

    /// Complete the conversation in `body` and return the final response.
    ///
    /// `body.messages` is extended in place with every assistant message and
    /// tool result of the run. It holds the conversation so far even when an
    /// error is returned.
    pub async fn create_message(&self, body: &mut MessageBody) -> TurnResult<CompletionResponse> {
        self.create_message_with_cancel(body, &CancellationToken::new())
            .await
    }

    /// [`create_message`](Self::create_message) under a cancellation token.
    ///
    /// Cancelling aborts a model call in flight with [`TurnError::Cancelled`].
    /// Tool calls in flight are cancelled too and come back as error results.
    pub async fn create_message_with_cancel(
        &self,
        body: &mut MessageBody,
        cancel: &CancellationToken,
    ) -> TurnResult<CompletionResponse> {
        let span = info_span!("conversation", id = %Uuid::new_v4(), model = %body.model);
        self.drive(body, cancel).instrument(span).await
    }

    async fn drive(
        &self,
        body: &mut MessageBody,
        cancel: &CancellationToken,
    ) -> TurnResult<CompletionResponse> {
        let request = body.turn_request();
        let mut messages = std::mem::take(&mut body.messages);
        let mut index = 0;
        let mut turns = 0;

        loop {
            if let Some(max_turns) = self.config.max_turns
                && turns >= max_turns
            {
                warn!(max_turns, "Turn limit reached");
                body.messages = messages;
                return Err(TurnError::TurnLimitExceeded(max_turns));
            }
            turns += 1;

            let outcome = self
                .machine
                .run_turn_with_cancel(&request, messages, index, cancel)
                .await;

            match outcome {
                Ok(TurnOutcome { status, stage }) => {
                    debug!(turn = turns, status = ?status, "Turn finished");
                    index = stage.index;
                    messages = stage.messages;
                    if status == TurnStatus::Done {
                        body.messages = messages;
                        info!(turns, "Conversation complete");
                        return stage.response.ok_or_else(|| {
                            TurnError::InvalidStage("ready stage without a response".to_string())
                        });
                    }
                }
                Err(interrupted) => {
                    let (stage, error) = interrupted.into_parts();
                    warn!(error = %error, code = error.error_code(), "Conversation stopped");
                    body.messages = stage.into_messages();
                    return Err(error);
                }
            }
        }
    }
}

enum SessionSource {
    Gateway(Arc<dyn ToolGateway>),
    #[cfg(feature = "mcp")]
    Bootstrap(SessionBootstrap),
}

enum ConfigSource {
    Given(DriverConfig),
    File(PathBuf),
}

/// Builder for [`Driver`].
#[derive(Default)]
pub struct DriverBuilder {
    client: Option<Arc<dyn CompletionClient>>,
    source: Option<SessionSource>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
    config: Option<ConfigSource>,
}

impl DriverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Use an already connected tool session.
    #[must_use]
    pub fn gateway(mut self, gateway: Arc<dyn ToolGateway>) -> Self {
        self.source = Some(SessionSource::Gateway(gateway));
        self
    }

    /// Bootstrap an MCP tool session when building.
    #[cfg(feature = "mcp")]
    #[must_use]
    pub fn session(mut self, bootstrap: SessionBootstrap) -> Self {
        self.source = Some(SessionSource::Bootstrap(bootstrap));
        self
    }

    /// Diagnostics sink. Defaults to [`TracingDiagnostics`].
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Driver configuration. Without one, [`build`](Self::build) reads it
    /// from the `TOOLLOOP_*` environment variables.
    #[must_use]
    pub fn config(mut self, config: DriverConfig) -> Self {
        self.config = Some(ConfigSource::Given(config));
        self
    }

    /// Load the driver configuration from a TOML file when building.
    #[must_use]
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = Some(ConfigSource::File(path.into()));
        self
    }

    /// Resolve the tool session and fetch its catalog.
    pub async fn build(self) -> TurnResult<Driver> {
        let client = self
            .client
            .ok_or(TurnError::MissingComponent("completion client"))?;
        let source = self
            .source
            .ok_or(TurnError::MissingComponent("tool session"))?;
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(TracingDiagnostics));
        let config = match self.config {
            Some(ConfigSource::Given(config)) => config,
            Some(ConfigSource::File(path)) => DriverConfig::load_from_file(path)?,
            None => DriverConfig::from_env()?,
        };

        let gateway: Arc<dyn ToolGateway> = match source {
            SessionSource::Gateway(gateway) => gateway,
            #[cfg(feature = "mcp")]
            SessionSource::Bootstrap(bootstrap) => Arc::new(McpSession::connect(bootstrap).await?),
        };

        let catalog = gateway.list_tools().await.map_err(TurnError::Catalog)?;
        let tools: Vec<ToolDescriptor> = catalog.into_iter().map(ToolDescriptor::from).collect();
        info!(
            tools = tools.len(),
            names = ?tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "Tool catalog loaded"
        );

        let invoker = ToolInvoker::new(gateway.clone(), diagnostics.clone())
            .with_timeout(config.tool_timeout);
        let machine = TurnMachine::new(client, invoker, tools, diagnostics)
            .with_tool_choice(config.tool_choice());

        Ok(Driver {
            machine,
            gateway,
            config,
        })
    }
}
