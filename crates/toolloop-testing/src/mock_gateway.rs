//! # Mock Tool Gateway
//!
//! A [`ToolGateway`] whose tools return predefined results, letting tests
//! drive conversations without a real gateway process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use toolloop_core::{
    CatalogEntry, GatewayError, GatewayResult, ToolGateway, ToolInvocation, ToolOutput,
};

use crate::lock;

/// What a mock tool does when called
#[derive(Debug, Clone)]
pub enum MockToolBehavior {
    /// Return this content
    Respond(Value),
    /// Fail with this error
    Fail(GatewayError),
    /// Wait, then return the content. Cancellation still wins.
    Delay(Duration, Value),
    /// Never finish on its own; only cancellation ends the call
    Hang,
}

/// A tool gateway with a fixed catalog and scripted tool behaviours.
///
/// Behaviours are looked up by tool name when a call arrives, independently
/// of the catalog. A name without a behaviour fails with
/// [`GatewayError::ToolNotFound`].
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    catalog: Vec<CatalogEntry>,
    catalog_error: Option<GatewayError>,
    behaviors: HashMap<String, MockToolBehavior>,
    calls: Arc<Mutex<Vec<ToolInvocation>>>,
}

impl MockGateway {
    /// Create a gateway with an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise a tool in the catalog
    #[must_use]
    pub fn with_tool(mut self, entry: CatalogEntry) -> Self {
        self.catalog.push(entry);
        self
    }

    /// Set the behaviour of a tool
    #[must_use]
    pub fn with_behavior(mut self, name: impl Into<String>, behavior: MockToolBehavior) -> Self {
        self.behaviors.insert(name.into(), behavior);
        self
    }

    /// Make `list_tools` fail
    #[must_use]
    pub fn with_catalog_error(mut self, error: GatewayError) -> Self {
        self.catalog_error = Some(error);
        self
    }

    /// Every invocation received, in arrival order
    pub fn calls(&self) -> Vec<ToolInvocation> {
        lock(&self.calls).clone()
    }

    /// Get the number of calls received
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Check if a tool was called at least once
    pub fn was_called(&self, name: &str) -> bool {
        lock(&self.calls).iter().any(|call| call.name == name)
    }

    /// Forget recorded calls
    pub fn reset(&self) {
        lock(&self.calls).clear();
    }
}

#[async_trait]
impl ToolGateway for MockGateway {
    async fn list_tools(&self) -> GatewayResult<Vec<CatalogEntry>> {
        match &self.catalog_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.catalog.clone()),
        }
    }

    async fn call_tool(
        &self,
        invocation: ToolInvocation,
        cancel: CancellationToken,
    ) -> GatewayResult<ToolOutput> {
        lock(&self.calls).push(invocation.clone());
        tracing::debug!(tool = %invocation.name, "Mock tool called");

        let Some(behavior) = self.behaviors.get(&invocation.name) else {
            return Err(GatewayError::ToolNotFound(invocation.name));
        };

        match behavior {
            MockToolBehavior::Respond(content) => Ok(ToolOutput::new(content.clone())),
            MockToolBehavior::Fail(error) => Err(error.clone()),
            MockToolBehavior::Delay(delay, content) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(GatewayError::Cancelled),
                    _ = tokio::time::sleep(*delay) => Ok(ToolOutput::new(content.clone())),
                }
            }
            MockToolBehavior::Hang => {
                cancel.cancelled().await;
                Err(GatewayError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway() -> MockGateway {
        MockGateway::new()
            .with_tool(CatalogEntry::new("add", json!({"type": "object"})))
            .with_behavior(
                "add",
                MockToolBehavior::Respond(json!({"type": "text", "text": "4"})),
            )
    }

    #[tokio::test]
    async fn test_catalog_and_response() {
        let gateway = gateway();
        let catalog = gateway.list_tools().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "add");

        let output = gateway
            .call_tool(
                ToolInvocation::new("add", json!({"a": 2, "b": 2})),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(output.content, json!({"type": "text", "text": "4"}));
        assert_eq!(gateway.call_count(), 1);
        assert!(gateway.was_called("add"));
        assert_eq!(gateway.calls()[0].arguments, json!({"a": 2, "b": 2}));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = gateway()
            .call_tool(ToolInvocation::new("nope", json!({})), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ToolNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_catalog_error() {
        let gateway =
            MockGateway::new().with_catalog_error(GatewayError::Transport("down".to_string()));
        assert!(gateway.list_tools().await.is_err());
    }

    #[tokio::test]
    async fn test_hang_ends_on_cancel() {
        let gateway = MockGateway::new().with_behavior("wait", MockToolBehavior::Hang);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = gateway
            .call_tool(ToolInvocation::new("wait", json!({})), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_then_respond() {
        let gateway = MockGateway::new().with_behavior(
            "slow",
            MockToolBehavior::Delay(Duration::from_secs(3), json!("late")),
        );
        let output = gateway
            .call_tool(ToolInvocation::new("slow", json!({})), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.content, json!("late"));
    }

    #[test]
    fn test_clones_share_history() {
        let gateway = gateway();
        let clone = gateway.clone();
        tokio_test::block_on(clone.call_tool(
            ToolInvocation::new("add", json!({})),
            CancellationToken::new(),
        ))
        .unwrap();
        assert_eq!(gateway.call_count(), 1);
        gateway.reset();
        assert_eq!(clone.call_count(), 0);
    }
}
