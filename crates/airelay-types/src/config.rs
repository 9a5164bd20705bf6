//! Global configuration types for airelay.
//!
//! `GlobalConfig` represents the top-level `config.toml` in the data
//! directory. Runtime-mutable routing settings live in the database instead.

use serde::{Deserialize, Serialize};

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Thresholds used to derive provider health states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// A successful call at or above this latency counts as degraded.
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
    /// Window success rate below this fraction counts as degraded.
    #[serde(default = "default_min_success_rate")]
    pub min_success_rate: f64,
    /// Number of health check results retained in memory and storage.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_slow_threshold_ms() -> u64 {
    5_000
}

fn default_min_success_rate() -> f64 {
    0.5
}

fn default_history_capacity() -> usize {
    100
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            slow_threshold_ms: default_slow_threshold_ms(),
            min_success_rate: default_min_success_rate(),
            history_capacity: default_history_capacity(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Export spans through the OpenTelemetry stdout exporter.
    #[serde(default)]
    pub otel: bool,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.health.slow_threshold_ms, 5_000);
        assert_eq!(config.health.history_capacity, 100);
        assert!(!config.telemetry.otel);
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert!((config.health.min_success_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
[server]
port = 8080

[health]
slow_threshold_ms = 2500
history_capacity = 20

[telemetry]
json_logs = true
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.health.slow_threshold_ms, 2500);
        assert_eq!(config.health.history_capacity, 20);
        assert!((config.health.min_success_rate - 0.5).abs() < f64::EPSILON);
        assert!(config.telemetry.json_logs);
    }
}
