/// Environment variable names used by this crate for convenient
/// configuration of the telemetry transport from services.
///
/// These are purely helpers; the core sink and formatter types remain
/// decoupled from environment access.

/// Collector base URL, e.g. `https://collector.example.com`.
pub const TELEMETRY_SINK_URL_ENV: &str = "TELEMETRY_SINK_URL";

/// Optional API key sent with every request.
pub const TELEMETRY_SINK_API_KEY_ENV: &str = "TELEMETRY_SINK_API_KEY";

/// Optional logical application name reported to the collector.
pub const TELEMETRY_SINK_APP_NAME_ENV: &str = "TELEMETRY_SINK_APP_NAME";

/// Minimum forwarded level name, e.g. `warning`.
pub const TELEMETRY_SINK_MIN_LEVEL_ENV: &str = "TELEMETRY_SINK_MIN_LEVEL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
