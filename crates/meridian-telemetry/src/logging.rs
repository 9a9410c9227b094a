//! Log subscriber installation.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// The filter honors `RUST_LOG` when set, otherwise the configured
/// level. Installing twice returns an error instead of panicking so
/// embedding in tests stays harmless.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(raw) => EnvFilter::try_new(raw),
        Err(_) => EnvFilter::try_new(&config.log_level),
    }
    .map_err(|_| TelemetryError::InvalidFilter(config.log_level.clone()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json_output {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|error| TelemetryError::SubscriberInit(error.to_string()))
}
