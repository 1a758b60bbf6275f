//! MCP tool session
//!
//! Spawns the tool gateway as a child process, performs the MCP handshake and
//! exposes the session as a [`ToolGateway`].

use std::collections::HashMap;

use async_trait::async_trait;
use rmcp::{
    RoleClient, ServiceExt,
    model::{ClientInfo, Implementation},
    service::RunningService,
    transport::TokioChildProcess,
};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use toolloop_core::{
    CatalogEntry, GatewayError, GatewayResult, ToolGateway, ToolInvocation, ToolOutput,
};
use tracing::{debug, info};

use crate::adapter;
use crate::error::{McpError, McpResult};

/// Environment variable carrying the session id to the gateway process.
pub const SESSION_ID_ENV: &str = "TOOLLOOP_SESSION_ID";

/// Environment variable carrying the active profile to the gateway process.
pub const PROFILE_ENV: &str = "TOOLLOOP_PROFILE";

/// Profile used when none is given.
pub const DEFAULT_PROFILE: &str = "default";

/// How to start the gateway process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl SessionOptions {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Inputs for bootstrapping a tool session.
///
/// The session id is the credential the gateway authenticates with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBootstrap {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub options: SessionOptions,
}

impl SessionBootstrap {
    pub fn new(session_id: impl Into<String>, options: SessionOptions) -> Self {
        Self {
            session_id: session_id.into(),
            profile: None,
            options,
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// The active profile, `"default"` unless set.
    pub fn profile(&self) -> &str {
        self.profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    fn validate(&self) -> McpResult<()> {
        if self.session_id.trim().is_empty() {
            return Err(McpError::InvalidBootstrap(
                "session id cannot be empty".to_string(),
            ));
        }
        if self.options.command.trim().is_empty() {
            return Err(McpError::InvalidBootstrap(
                "gateway command cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The command that starts the gateway process.
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.options.command);
        command
            .args(&self.options.args)
            .envs(&self.options.env)
            .env(SESSION_ID_ENV, &self.session_id)
            .env(PROFILE_ENV, self.profile());
        command
    }
}

/// A connected MCP tool session.
pub struct McpSession {
    service: RunningService<RoleClient, ClientInfo>,
    session_id: String,
    profile: String,
}

impl std::fmt::Debug for McpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpSession")
            .field("session_id", &self.session_id)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl McpSession {
    /// Spawn the gateway process and complete the MCP handshake.
    pub async fn connect(bootstrap: SessionBootstrap) -> McpResult<Self> {
        bootstrap.validate()?;
        info!(
            command = %bootstrap.options.command,
            profile = %bootstrap.profile(),
            "Starting MCP tool session"
        );

        let transport = TokioChildProcess::new(bootstrap.command())?;
        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::ConnectionError(e.to_string()))?;

        let profile = bootstrap.profile().to_string();
        Ok(Self::from_service(service, bootstrap.session_id, profile))
    }

    /// Wrap an already running client service.
    pub fn from_service(
        service: RunningService<RoleClient, ClientInfo>,
        session_id: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            service,
            session_id: session_id.into(),
            profile: profile.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Shut the session down.
    pub async fn close(self) -> McpResult<()> {
        let reason = self
            .service
            .cancel()
            .await
            .map_err(|e| McpError::ConnectionError(e.to_string()))?;
        debug!(reason = ?reason, session_id = %self.session_id, "MCP session closed");
        Ok(())
    }
}

#[async_trait]
impl ToolGateway for McpSession {
    async fn list_tools(&self) -> GatewayResult<Vec<CatalogEntry>> {
        let tools = self
            .service
            .peer()
            .list_all_tools()
            .await
            .map_err(|e| McpError::ProtocolError(e.to_string()))?;
        debug!(count = tools.len(), "Listed MCP tools");
        Ok(tools.iter().map(adapter::catalog_entry).collect())
    }

    async fn call_tool(
        &self,
        invocation: ToolInvocation,
        cancel: CancellationToken,
    ) -> GatewayResult<ToolOutput> {
        let params = adapter::call_params(&invocation);
        debug!(tool = %invocation.name, "Calling MCP tool");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            result = self.service.peer().call_tool(params) => result,
        };
        let result = result.map_err(McpError::from_rmcp_error)?;
        adapter::tool_output(result)
    }
}

/// Identity announced during the handshake.
pub fn client_info() -> ClientInfo {
    ClientInfo {
        protocol_version: Default::default(),
        capabilities: Default::default(),
        client_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn options() -> SessionOptions {
        SessionOptions::new("tool-gateway").with_args(["--stdio"])
    }

    #[test]
    fn test_profile_defaults() {
        let bootstrap = SessionBootstrap::new("sess-1", options());
        assert_eq!(bootstrap.profile(), "default");

        let bootstrap = bootstrap.with_profile("staging");
        assert_eq!(bootstrap.profile(), "staging");
    }

    #[test]
    fn test_command_carries_credentials() {
        let bootstrap = SessionBootstrap::new("sess-1", options().with_env("RUST_LOG", "debug"));
        let command = bootstrap.command();
        let std_command = command.as_std();

        assert_eq!(std_command.get_program(), "tool-gateway");
        assert_eq!(std_command.get_args().collect::<Vec<_>>(), vec!["--stdio"]);

        let envs: HashMap<_, _> = std_command
            .get_envs()
            .filter_map(|(k, v)| Some((k.to_str()?.to_string(), v?.to_str()?.to_string())))
            .collect();
        assert_eq!(envs.get(SESSION_ID_ENV).map(String::as_str), Some("sess-1"));
        assert_eq!(envs.get(PROFILE_ENV).map(String::as_str), Some("default"));
        assert_eq!(envs.get("RUST_LOG").map(String::as_str), Some("debug"));
    }

    #[rstest]
    #[case::blank_session_id(SessionBootstrap::new(" ", options()), "session id cannot be empty")]
    #[case::empty_command(
        SessionBootstrap::new("sess-1", SessionOptions::default()),
        "gateway command cannot be empty"
    )]
    #[case::blank_command(
        SessionBootstrap::new("sess-1", SessionOptions::new("  ")),
        "gateway command cannot be empty"
    )]
    #[tokio::test]
    async fn test_invalid_bootstrap_rejected(
        #[case] bootstrap: SessionBootstrap,
        #[case] reason: &str,
    ) {
        let err = McpSession::connect(bootstrap).await.unwrap_err();
        assert!(
            matches!(&err, McpError::InvalidBootstrap(msg) if msg == reason),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_client_info_names_this_crate() {
        let info = client_info();
        assert_eq!(info.client_info.name, "toolloop-mcp");
        assert_eq!(info.client_info.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_missing_executable_fails_to_spawn() {
        let bootstrap = SessionBootstrap::new(
            "sess-1",
            SessionOptions::new("toolloop-nonexistent-gateway-12345"),
        );
        let err = McpSession::connect(bootstrap).await.unwrap_err();
        assert!(
            matches!(err, McpError::Spawn(_) | McpError::ConnectionError(_)),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_bootstrap_deserializes_without_profile() {
        let bootstrap: SessionBootstrap = serde_json::from_value(serde_json::json!({
            "session_id": "sess-1",
            "options": {"command": "tool-gateway"}
        }))
        .unwrap();
        assert_eq!(bootstrap.profile(), "default");
        assert!(bootstrap.options.args.is_empty());
    }
}
