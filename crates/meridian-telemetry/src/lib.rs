//! # Meridian Telemetry
//!
//! Structured-logging initialization for the Meridian node.
//!
//! Every subsystem crate logs through `tracing`; this crate owns the one
//! place a subscriber is installed. Metrics registries live with their
//! subsystems behind each crate's `metrics` feature.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meridian_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("telemetry init");
//!     // Application code; the guard keeps logging active
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MERIDIAN_LOG_LEVEL` | `info` | Log level filter |
//! | `MERIDIAN_SERVICE_NAME` | `meridian-node` | Service name stamped on logs |
//! | `MERIDIAN_LOG_JSON` | `false` | Emit JSON lines instead of text |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize log subscriber: {0}")]
    SubscriberInit(String),

    #[error("invalid log filter {0:?}")]
    InvalidFilter(String),
}

/// Guard that keeps telemetry active for the process lifetime.
pub struct TelemetryGuard {
    _private: (),
}

/// Install the logging stack. Call once, early in `main`.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(config)?;
    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        "telemetry initialized"
    );
    Ok(TelemetryGuard { _private: () })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "meridian-node");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_output);
    }
}
