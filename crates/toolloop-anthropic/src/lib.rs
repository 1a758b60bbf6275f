//! # Toolloop Anthropic
//!
//! [`CompletionClient`](toolloop_core::CompletionClient) for the Anthropic
//! Messages API.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolloop_anthropic::AnthropicClient;
//!
//! let client = Arc::new(AnthropicClient::from_env()?);
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::AnthropicClient;
pub use config::{AnthropicConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{AnthropicError, AnthropicResult};
