//! Client configuration
//!
//! ## Environment Variables
//!
//! - `ANTHROPIC_API_KEY` - API key (required)
//! - `ANTHROPIC_BASE_URL` - Service URL (default: `https://api.anthropic.com`)
//! - `ANTHROPIC_VERSION` - `anthropic-version` header (default: `2023-06-01`)
//! - `TOOLLOOP_HTTP_TIMEOUT` - Request timeout, e.g. `90s` or `10m` (default: 600s)

use std::{env, time::Duration};
use url::Url;

use crate::error::{AnthropicError, AnthropicResult};

/// Default service URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default `anthropic-version` header value.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Default request timeout. Long tool-use turns can take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Settings for [`AnthropicClient`](crate::AnthropicClient).
#[derive(Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: Url,
    pub api_version: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AnthropicConfig {
    /// Configuration with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> AnthropicResult<Self> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> AnthropicResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> AnthropicResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(AnthropicError::MissingApiKey)?;
        let mut config = Self::new(api_key)?;

        if let Some(base_url) = lookup("ANTHROPIC_BASE_URL") {
            config = config.with_base_url(&base_url)?;
        }
        if let Some(version) = lookup("ANTHROPIC_VERSION") {
            config.api_version = version;
        }
        if let Some(timeout) = lookup("TOOLLOOP_HTTP_TIMEOUT") {
            config.timeout = humantime::parse_duration(timeout.trim()).map_err(|e| {
                AnthropicError::InvalidEnvVar {
                    key: "TOOLLOOP_HTTP_TIMEOUT".to_string(),
                    message: format!("invalid duration '{timeout}': {e}"),
                }
            })?;
        }

        Ok(config)
    }

    /// Point the client at another service URL. A path prefix such as a
    /// proxy mount point is kept in front of the API paths.
    pub fn with_base_url(mut self, base_url: &str) -> AnthropicResult<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parse a base URL whose path ends in `/`, so relative joins extend it.
fn parse_base_url(raw: &str) -> AnthropicResult<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
