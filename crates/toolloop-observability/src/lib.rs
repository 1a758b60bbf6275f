//! Toolloop Observability
//!
//! Installs the global `tracing` subscriber used by binaries and tests that
//! drive conversations. Library crates only emit events; nothing here is
//! required for them to work.
//!
//! ## Environment Variables
//!
//! - `TOOLLOOP_LOG` - filter directives, e.g. `toolloop_agent=debug` (default: `info`)
//! - `TOOLLOOP_LOG_FORMAT` - `json` or `pretty` (default: `json`)

pub mod trace;

use std::{env, fmt, str::FromStr};

pub use trace::{init_tracing, try_init_tracing};

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "TOOLLOOP_LOG";

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "TOOLLOOP_LOG_FORMAT";

/// Output format of the fmt subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Multi-line human readable output
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ObservabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(ObservabilityError::Config(format!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Pretty => f.write_str("pretty"),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives
    pub filter: String,
    pub format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ObservabilityError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ObservabilityError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_ENV).filter(|f| !f.trim().is_empty()) {
            config.filter = filter;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.format = format.parse()?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Observability framework errors
#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ObservabilityConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ObservabilityConfig::default());
        assert_eq!(config.filter, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_env_overrides() {
        let config = ObservabilityConfig::from_lookup(lookup(&[
            (LOG_ENV, "toolloop_agent=debug,warn"),
            (LOG_FORMAT_ENV, "pretty"),
        ]))
        .unwrap();
        assert_eq!(config.filter, "toolloop_agent=debug,warn");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_blank_filter_keeps_default() {
        let config = ObservabilityConfig::from_lookup(lookup(&[(LOG_ENV, "  ")])).unwrap();
        assert_eq!(config.filter, "info");
    }

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("JSON", LogFormat::Json)]
    #[case("pretty", LogFormat::Pretty)]
    #[case(" text ", LogFormat::Pretty)]
    fn test_format_parsing(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(input.parse::<LogFormat>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = ObservabilityConfig::from_lookup(lookup(&[(LOG_FORMAT_ENV, "xml")])).unwrap_err();
        assert!(matches!(err, ObservabilityError::Config(msg) if msg.contains("xml")));
    }
}
