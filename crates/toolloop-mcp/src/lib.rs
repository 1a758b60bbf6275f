//! # Toolloop MCP
//!
//! Model Context Protocol tool session for the toolloop driver.
//!
//! [`McpSession`] starts a tool gateway process from a [`SessionBootstrap`],
//! completes the MCP handshake with `rmcp`, and implements
//! [`ToolGateway`](toolloop_core::ToolGateway) over it.
//!
//! ```rust,ignore
//! use toolloop_mcp::{McpSession, SessionBootstrap, SessionOptions};
//!
//! let bootstrap = SessionBootstrap::new(
//!     "sess-42",
//!     SessionOptions::new("npx").with_args(["@acme/tool-gateway"]),
//! )
//! .with_profile("staging");
//!
//! let session = McpSession::connect(bootstrap).await?;
//! ```

pub mod adapter;
pub mod error;
pub mod session;

pub use error::{McpError, McpResult};
pub use session::{
    DEFAULT_PROFILE, McpSession, PROFILE_ENV, SESSION_ID_ENV, SessionBootstrap, SessionOptions,
    client_info,
};
