//! Telemetry configuration.

/// Logging configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name stamped on every log line.
    pub service_name: String,
    /// Default log level filter (overridable per target via the filter
    /// syntax, e.g. `info,md_01_peer_network=debug`).
    pub log_level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json_output: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "meridian-node".to_string(),
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

impl TelemetryConfig {
    /// Read configuration from `MERIDIAN_*` environment variables,
    /// falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: std::env::var("MERIDIAN_SERVICE_NAME")
                .unwrap_or(defaults.service_name),
            log_level: std::env::var("MERIDIAN_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_output: std::env::var("MERIDIAN_LOG_JSON")
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.json_output),
        }
    }
}
