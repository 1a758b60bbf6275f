//! # Toolloop Agent
//!
//! Drives a conversation with a completion service that may request tool
//! calls, until the model gives a final answer.
//!
//! - [`invoker`]: runs one tool call and turns failures into error results
//! - [`schema_error`]: recognises completion errors caused by a bad tool schema
//! - [`stage`] and [`machine`]: the resumable per-turn state machine
//! - [`driver`]: the facade that runs turns to completion
//! - [`config`]: driver configuration from code, environment or TOML
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolloop_agent::{Driver, DriverConfig};
//! use toolloop_core::Message;
//!
//! let driver = Driver::builder()
//!     .client(client)
//!     .gateway(gateway)
//!     .config(DriverConfig::from_env()?)
//!     .build()
//!     .await?;
//!
//! let mut body = driver.body(vec![Message::user("What is 2+2?")]);
//! let response = driver.create_message(&mut body).await?;
//! println!("{}", response.text_content());
//! ```
//!
//! ## Step-wise driving
//!
//! ```rust,ignore
//! use toolloop_agent::{TurnMachine, TurnRequest};
//!
//! let request = TurnRequest::new("claude-sonnet-4-20250514");
//! let mut stage = TurnMachine::begin(messages, 0);
//! while !stage.is_ready() {
//!     stage = machine.advance(&request, stage).await?;
//!     // persist `stage` here to resume later
//! }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod invoker;
pub mod machine;
pub mod schema_error;
pub mod stage;

pub use config::{ConfigError, DriverConfig, DriverConfigBuilder};
pub use driver::{Driver, DriverBuilder, MessageBody};
pub use error::{Interrupted, TurnError, TurnResult};
pub use invoker::{ToolCallError, ToolInvoker, normalize_content};
pub use machine::{TurnMachine, TurnOutcome, TurnRequest, TurnStatus};
pub use schema_error::classify;
pub use stage::{Stage, StageStatus};

#[cfg(feature = "mcp")]
pub use toolloop_mcp::{SessionBootstrap, SessionOptions};
