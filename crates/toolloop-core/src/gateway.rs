//! The tool-execution gateway contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::GatewayResult;
use crate::tool::{CatalogEntry, ToolInvocation, ToolOutput};

/// Something that can list and run tools.
///
/// Implementations must honour `cancel`: once it fires, the call should
/// return `GatewayError::Cancelled` as soon as practical.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// The current tool catalog.
    async fn list_tools(&self) -> GatewayResult<Vec<CatalogEntry>>;

    /// Run one tool (`tools/call`).
    async fn call_tool(
        &self,
        invocation: ToolInvocation,
        cancel: CancellationToken,
    ) -> GatewayResult<ToolOutput>;
}
