//! Tool Invoker
//!
//! Executes one requested tool call against the [`ToolGateway`] and turns the
//! outcome into a `tool_result` block. Failures never escape: they become error
//! results that the model gets to see, plus a `tool_failure` diagnostics event.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolloop_core::{
    ContentBlock, Diagnostics, GatewayError, ToolFailure, ToolGateway, ToolInvocation, ToolOutput,
    ToolUse, error_chain,
};
use tracing::debug;

/// Why a single tool call produced no output.
#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Tool '{name}' timed out after {timeout:?}")]
    TimedOut { name: String, timeout: Duration },
}

/// Runs tool calls through a gateway.
#[derive(Clone)]
pub struct ToolInvoker {
    gateway: Arc<dyn ToolGateway>,
    diagnostics: Arc<dyn Diagnostics>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ToolInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolInvoker")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ToolInvoker {
    pub fn new(gateway: Arc<dyn ToolGateway>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            gateway,
            diagnostics,
            timeout: None,
        }
    }

    /// Bound every call by `timeout`. `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute `tool_use` and build the matching `tool_result` block.
    ///
    /// The call runs under a child of `cancel`: cancelling the parent aborts
    /// it, and the child is cancelled once the call is over so an abandoned
    /// gateway call can stop.
    pub async fn invoke(&self, tool_use: ToolUse<'_>, cancel: &CancellationToken) -> ContentBlock {
        let invocation = ToolInvocation::new(tool_use.name, tool_use.input.clone());
        debug!(tool = %tool_use.name, tool_use_id = %tool_use.id, "Invoking tool");

        match self.call(invocation, cancel).await {
            Ok(output) => {
                ContentBlock::tool_result(tool_use.id, normalize_content(output.content))
            }
            Err(err) => {
                let failure = ToolFailure {
                    tool_use_id: tool_use.id.to_string(),
                    name: tool_use.name.to_string(),
                    message: err.to_string(),
                    stack: error_chain(&err),
                };
                self.diagnostics.tool_failure(&failure);
                ContentBlock::tool_error(tool_use.id, failure.message)
            }
        }
    }

    async fn call(
        &self,
        invocation: ToolInvocation,
        cancel: &CancellationToken,
    ) -> Result<ToolOutput, ToolCallError> {
        let token = cancel.child_token();
        let _guard = token.clone().drop_guard();
        let name = invocation.name.clone();
        let call = self.gateway.call_tool(invocation, token.clone());

        match self.timeout {
            Some(timeout) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(GatewayError::Cancelled.into()),
                result = tokio::time::timeout(timeout, call) => match result {
                    Ok(result) => result.map_err(ToolCallError::from),
                    Err(_) => Err(ToolCallError::TimedOut { name, timeout }),
                },
            },
            None => tokio::select! {
                biased;
                _ = token.cancelled() => Err(GatewayError::Cancelled.into()),
                result = call => result.map_err(ToolCallError::from),
            },
        }
    }
}

/// Reshape gateway content into the block list the model expects.
///
/// Each typed item `{ "type": kind, kind: payload, .. }` keeps only its
/// payload and discriminator. A single typed object counts as a one-item list.
/// Anything else is returned unchanged.
pub fn normalize_content(content: Value) -> Value {
    match content {
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_item).collect()),
        Value::Object(map) if content_kind(&map).is_some() => {
            Value::Array(vec![normalize_item(Value::Object(map))])
        }
        other => other,
    }
}

fn normalize_item(item: Value) -> Value {
    let Value::Object(map) = &item else {
        return item;
    };
    let Some(kind) = content_kind(map) else {
        return item;
    };
    let Some(payload) = map.get(kind) else {
        return item;
    };

    let mut normalized = Map::new();
    normalized.insert(kind.to_string(), payload.clone());
    normalized.insert("type".to_string(), Value::String(kind.to_string()));
    Value::Object(normalized)
}

fn content_kind(map: &Map<String, Value>) -> Option<&str> {
    map.get("type").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolloop_core::{CatalogEntry, NoopDiagnostics};
    use toolloop_testing::{MockGateway, MockToolBehavior, RecordingDiagnostics};

    fn tool_use<'a>(id: &'a str, name: &'a str, input: &'a Value) -> ToolUse<'a> {
        ToolUse { id, name, input }
    }

    fn invoker(gateway: MockGateway) -> ToolInvoker {
        ToolInvoker::new(Arc::new(gateway), Arc::new(NoopDiagnostics))
    }

    #[test]
    fn test_normalize_list_keeps_payload_and_type() {
        let content = json!([
            {"type": "text", "text": "4", "annotations": {"audience": ["user"]}},
            {"type": "image", "image": "aGk="}
        ]);
        assert_eq!(
            normalize_content(content),
            json!([
                {"text": "4", "type": "text"},
                {"image": "aGk=", "type": "image"}
            ])
        );
    }

    #[test]
    fn test_normalize_single_typed_object_becomes_list() {
        let content = json!({"type": "text", "text": "4"});
        assert_eq!(normalize_content(content), json!([{"text": "4", "type": "text"}]));
    }

    #[test]
    fn test_normalize_passes_other_shapes_through() {
        assert_eq!(normalize_content(json!("plain")), json!("plain"));
        assert_eq!(normalize_content(json!(42)), json!(42));
        assert_eq!(normalize_content(json!({"value": 1})), json!({"value": 1}));
        assert_eq!(
            normalize_content(json!([{"type": "text"}, "loose"])),
            json!([{"type": "text"}, "loose"])
        );
    }

    #[tokio::test]
    async fn test_invoke_success_builds_result() {
        let gateway = MockGateway::new()
            .with_tool(CatalogEntry::new("add", json!({"type": "object"})))
            .with_behavior(
                "add",
                MockToolBehavior::Respond(json!({"type": "text", "text": "4"})),
            );
        let gateway = Arc::new(gateway);
        let invoker = ToolInvoker::new(gateway.clone(), Arc::new(NoopDiagnostics));

        let input = json!({"a": 2, "b": 2});
        let block = invoker
            .invoke(tool_use("t1", "add", &input), &CancellationToken::new())
            .await;

        assert_eq!(
            block,
            ContentBlock::tool_result("t1", json!([{"text": "4", "type": "text"}]))
        );
        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "add");
        assert_eq!(calls[0].arguments, input);
    }

    #[tokio::test]
    async fn test_invoke_failure_becomes_error_result() {
        let gateway = MockGateway::new().with_behavior(
            "broken",
            MockToolBehavior::Fail(GatewayError::ToolReported("disk full".to_string())),
        );
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let invoker = ToolInvoker::new(Arc::new(gateway), diagnostics.clone());

        let input = json!({});
        let block = invoker
            .invoke(tool_use("t9", "broken", &input), &CancellationToken::new())
            .await;

        assert!(block.is_error());
        assert_eq!(block.tool_use_id(), Some("t9"));
        match &block {
            ContentBlock::ToolResult { content, .. } => {
                assert_eq!(content, &json!("Tool reported an error: disk full"));
            }
            other => panic!("expected tool_result, got {other:?}"),
        }

        let failures = diagnostics.tool_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].tool_use_id, "t9");
        assert_eq!(failures[0].name, "broken");
        assert!(failures[0].stack.contains("disk full"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_not_raised() {
        let input = json!({});
        let block = invoker(MockGateway::new())
            .invoke(tool_use("t1", "missing", &input), &CancellationToken::new())
            .await;
        assert!(block.is_error());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_times_out() {
        let gateway = MockGateway::new().with_behavior("slow", MockToolBehavior::Hang);
        let gateway = Arc::new(gateway);
        let invoker = ToolInvoker::new(gateway.clone(), Arc::new(NoopDiagnostics))
            .with_timeout(Some(Duration::from_secs(5)));

        let input = json!({});
        let block = invoker
            .invoke(tool_use("t1", "slow", &input), &CancellationToken::new())
            .await;

        assert!(block.is_error());
        match block {
            ContentBlock::ToolResult { content, .. } => {
                assert_eq!(content, json!("Tool 'slow' timed out after 5s"));
            }
            other => panic!("expected tool_result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_parent_cancellation_aborts_call() {
        let gateway = MockGateway::new().with_behavior("slow", MockToolBehavior::Hang);
        let invoker = invoker(gateway);
        let parent = CancellationToken::new();
        parent.cancel();

        let input = json!({});
        let block = invoker.invoke(tool_use("t1", "slow", &input), &parent).await;

        assert!(block.is_error());
        match block {
            ContentBlock::ToolResult { content, .. } => {
                assert_eq!(content, json!("Tool call cancelled"));
            }
            other => panic!("expected tool_result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_call_scope_does_not_cancel_parent() {
        let gateway = MockGateway::new()
            .with_behavior("ok", MockToolBehavior::Respond(json!("done")));
        let invoker = invoker(gateway);
        let parent = CancellationToken::new();

        let input = json!({});
        let block = invoker.invoke(tool_use("t1", "ok", &input), &parent).await;

        assert_eq!(block, ContentBlock::tool_result("t1", json!("done")));
        assert!(!parent.is_cancelled());
    }
}
