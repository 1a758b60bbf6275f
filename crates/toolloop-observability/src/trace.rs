//! Subscriber installation

use tracing_subscriber::EnvFilter;

use crate::{LogFormat, ObservabilityConfig, ObservabilityError};

/// Install the global fmt subscriber described by `config`.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), ObservabilityError> {
    let filter = EnvFilter::try_new(&config.filter).map_err(|e| {
        ObservabilityError::Config(format!("invalid filter '{}': {e}", config.filter))
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;

    tracing::info!(
        filter = %config.filter,
        format = %config.format,
        "Initialized structured tracing"
    );
    Ok(())
}

/// Install from the environment, ignoring an already installed subscriber.
///
/// Convenient in tests and examples where several entry points race to set
/// up logging.
pub fn try_init_tracing() -> Result<(), ObservabilityError> {
    let config = ObservabilityConfig::from_env()?;
    match init_tracing(&config) {
        Err(ObservabilityError::TracingInit(_)) | Ok(()) => Ok(()),
        Err(err) => Err(err),
    }
}
