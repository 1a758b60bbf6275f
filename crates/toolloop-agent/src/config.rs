//! # Driver Configuration
//!
//! Configuration for the [`Driver`](crate::driver::Driver), loadable from the
//! environment, from TOML, or assembled with [`DriverConfigBuilder`].
//!
//! ## Environment Variables
//!
//! - `TOOLLOOP_MODEL` - Model identifier (default: `claude-sonnet-4-20250514`)
//! - `TOOLLOOP_MAX_TOKENS` - Maximum tokens per response (default: 4096)
//! - `TOOLLOOP_SYSTEM` - System prompt (default: none)
//! - `TOOLLOOP_TOOL_CHOICE` - Name of a tool the model must call (default: automatic choice)
//! - `TOOLLOOP_TOOL_TIMEOUT` - Per tool call timeout, e.g. `30s`, `2m`, or `off` (default: 60s)
//! - `TOOLLOOP_MAX_TURNS` - Maximum model turns per conversation (default: unbounded)
//!
//! ## TOML
//!
//! ```toml
//! model = "claude-sonnet-4-20250514"
//! max_tokens = 2048
//! system = "Answer briefly."
//! tool_choice = "calculator"
//! tool_timeout = "30s"
//! max_turns = 16
//! ```

use serde::Deserialize;
use std::{env, path::Path, time::Duration};
use toolloop_core::{GenerationOptions, ToolChoice};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default maximum tokens per response.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default per tool call timeout.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Validated driver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    pub model: String,
    pub max_tokens: u32,
    pub system: Option<String>,
    /// Tool the model is forced to call; `None` lets the model choose.
    pub tool_choice: Option<String>,
    /// Per tool call timeout; `None` waits indefinitely.
    pub tool_timeout: Option<Duration>,
    /// Maximum number of model turns per conversation; `None` is unbounded.
    pub max_turns: Option<usize>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: None,
            tool_choice: None,
            tool_timeout: Some(DEFAULT_TOOL_TIMEOUT),
            max_turns: None,
        }
    }
}

impl DriverConfig {
    /// Start a builder with default values.
    #[must_use]
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::new()
    }

    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        DriverConfigBuilder::from_env()?.build()
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_toml(&content)
    }

    /// Load configuration from a TOML string. Missing keys keep their defaults.
    pub fn load_from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(toml_content)?;
        file.apply(DriverConfigBuilder::new())?.build()
    }

    /// The tool choice sent with each completion request.
    pub fn tool_choice(&self) -> ToolChoice {
        ToolChoice::from_forced(self.tool_choice.as_deref())
    }

    /// Generation options seeded from this configuration.
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens,
            system: self.system.clone(),
            ..GenerationOptions::default()
        }
    }
}

/// Builder for [`DriverConfig`] with environment variable support
#[derive(Debug, Clone, Default)]
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl DriverConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::default();

        if let Some(model) = lookup("TOOLLOOP_MODEL") {
            builder = builder.model(model);
        }
        if let Some(max_tokens) = parse_var::<u32>(&lookup, "TOOLLOOP_MAX_TOKENS")? {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(system) = lookup("TOOLLOOP_SYSTEM") {
            builder = builder.system(system);
        }
        if let Some(tool) = lookup("TOOLLOOP_TOOL_CHOICE").filter(|name| !name.is_empty()) {
            builder = builder.tool_choice(tool);
        }
        if let Some(raw) = lookup("TOOLLOOP_TOOL_TIMEOUT") {
            let timeout = parse_timeout(&raw).map_err(|message| ConfigError::InvalidEnvVar {
                key: "TOOLLOOP_TOOL_TIMEOUT".to_string(),
                message,
            })?;
            builder = builder.tool_timeout(timeout);
        }
        if let Some(max_turns) = parse_var::<usize>(&lookup, "TOOLLOOP_MAX_TURNS")? {
            builder = builder.max_turns(max_turns);
        }

        Ok(builder)
    }

    /// Set the model identifier
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the maximum tokens per response
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the system prompt
    #[must_use]
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.config.system = Some(system.into());
        self
    }

    /// Force the model to call the named tool
    #[must_use]
    pub fn tool_choice(mut self, tool: impl Into<String>) -> Self {
        self.config.tool_choice = Some(tool.into());
        self
    }

    /// Set the per tool call timeout; `None` disables it
    #[must_use]
    pub fn tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.tool_timeout = timeout;
        self
    }

    /// Bound the number of model turns per conversation
    #[must_use]
    pub fn max_turns(mut self, max_turns: usize) -> Self {
        self.config.max_turns = Some(max_turns);
        self
    }

    /// Validate configuration and build `DriverConfig`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the configuration is invalid.
    pub fn build(self) -> Result<DriverConfig, ConfigError> {
        self.validate()?;
        Ok(self.config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.config.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model cannot be empty".to_string(),
            ));
        }
        if self.config.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if self.config.max_turns == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_turns must be greater than 0".to_string(),
            ));
        }
        if self.config.tool_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ValidationError(
                "tool_timeout must be greater than 0".to_string(),
            ));
        }
        if let Some(tool) = &self.config.tool_choice
            && tool.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "tool_choice cannot be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// On-disk shape of the configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    model: Option<String>,
    max_tokens: Option<u32>,
    system: Option<String>,
    tool_choice: Option<String>,
    tool_timeout: Option<String>,
    max_turns: Option<usize>,
}

impl ConfigFile {
    fn apply(self, mut builder: DriverConfigBuilder) -> Result<DriverConfigBuilder, ConfigError> {
        if let Some(model) = self.model {
            builder = builder.model(model);
        }
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(system) = self.system {
            builder = builder.system(system);
        }
        if let Some(tool) = self.tool_choice {
            builder = builder.tool_choice(tool);
        }
        if let Some(raw) = self.tool_timeout {
            let timeout = parse_timeout(&raw).map_err(|message| {
                ConfigError::ValidationError(format!("tool_timeout: {message}"))
            })?;
            builder = builder.tool_timeout(timeout);
        }
        if let Some(max_turns) = self.max_turns {
            builder = builder.max_turns(max_turns);
        }
        Ok(builder)
    }
}

fn parse_timeout(raw: &str) -> Result<Option<Duration>, String> {
    match raw.trim().to_lowercase().as_str() {
        "off" | "none" | "0" => Ok(None),
        value => humantime::parse_duration(value)
            .map(Some)
            .map_err(|e| format!("invalid duration '{raw}': {e}")),
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid value '{val}': {e}"),
            }),
        None => Ok(None),
    }
}
