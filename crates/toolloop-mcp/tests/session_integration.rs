//! Integration tests for the MCP tool session
//!
//! A test MCP server runs in-process over duplex pipes; the session talks to
//! it exactly as it would to a spawned gateway.

use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use toolloop_core::{GatewayError, ToolGateway, ToolInvocation};
use toolloop_mcp::{McpSession, client_info};

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
struct AddRequest {
    #[schemars(description = "First operand")]
    a: f64,
    #[schemars(description = "Second operand")]
    b: f64,
}

#[derive(Clone)]
struct ArithmeticServer {
    tool_router: ToolRouter<Self>,
}

#[tool_router(router = tool_router)]
impl ArithmeticServer {
    fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(name = "add", description = "Add two numbers")]
    async fn add(&self, request: Parameters<AddRequest>) -> String {
        (request.0.a + request.0.b).to_string()
    }

    #[tool(name = "divide", description = "Divide a by b")]
    async fn divide(&self, request: Parameters<AddRequest>) -> Result<String, String> {
        if request.0.b == 0.0 {
            return Err("Division by zero".to_string());
        }
        Ok((request.0.a / request.0.b).to_string())
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for ArithmeticServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "arithmetic-test-server".to_string(),
                version: "0.1.0".to_string(),
                ..Default::default()
            },
            instructions: None,
        }
    }
}

async fn connect() -> (McpSession, JoinHandle<()>) {
    let (client_read, server_write) = tokio::io::duplex(4096);
    let (server_read, client_write) = tokio::io::duplex(4096);

    let server_transport =
        rmcp::transport::async_rw::AsyncRwTransport::new(server_read, server_write);
    let server = tokio::spawn(async move {
        if let Ok(service) = ArithmeticServer::new().serve(server_transport).await {
            let _ = service.waiting().await;
        }
    });

    let client_transport =
        rmcp::transport::async_rw::AsyncRwTransport::new(client_read, client_write);
    let service = client_info()
        .serve(client_transport)
        .await
        .expect("handshake with test server");

    (McpSession::from_service(service, "sess-test", "default"), server)
}

#[tokio::test]
async fn test_session_lists_catalog() {
    let (session, server) = connect().await;

    let mut tools = session.list_tools().await.unwrap();
    tools.sort_by(|a, b| a.name.cmp(&b.name));

    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["add", "divide"]);
    assert_eq!(tools[0].description.as_deref(), Some("Add two numbers"));
    assert_eq!(tools[0].input_schema["type"], "object");
    assert!(tools[0].input_schema["properties"].get("a").is_some());

    server.abort();
}

#[tokio::test]
async fn test_session_calls_tool() {
    let (session, server) = connect().await;

    let output = session
        .call_tool(
            ToolInvocation::new("add", json!({"a": 2, "b": 2})),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(output.content, json!([{"type": "text", "text": "4"}]));
    server.abort();
}

#[tokio::test]
async fn test_tool_error_result_is_reported() {
    let (session, server) = connect().await;

    let err = session
        .call_tool(
            ToolInvocation::new("divide", json!({"a": 1, "b": 0})),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::ToolReported(msg) if msg.contains("Division by zero")));
    server.abort();
}

#[tokio::test]
async fn test_cancelled_token_short_circuits() {
    let (session, server) = connect().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = session
        .call_tool(ToolInvocation::new("add", json!({"a": 1, "b": 1})), cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Cancelled));
    server.abort();
}

#[tokio::test]
async fn test_close_session() {
    let (session, server) = connect().await;
    assert_eq!(session.session_id(), "sess-test");
    session.close().await.unwrap();
    server.abort();
}
