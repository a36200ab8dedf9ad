//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Generative model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Full URL of the generate-content endpoint.
    #[serde(default)]
    pub endpoint: String,

    /// Bearer credential sent in the `Authorization` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Skip TLS certificate verification. Off unless explicitly enabled.
    #[serde(default)]
    pub insecure_skip_verify: bool,

    /// Bound on one HTTPS round trip.
    /// Default: 60
    #[serde(default = "ModelConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ModelConfig {
    fn default_timeout_secs() -> u64 {
        60
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: None,
            insecure_skip_verify: false,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Tool server executable, spawned once per protocol call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    /// Path of the executable. Invoked with no arguments.
    #[serde(default)]
    pub command: PathBuf,

    /// Bound on one spawn-write-wait cycle.
    /// Default: 30
    #[serde(default = "ToolsConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ToolsConfig {
    fn default_timeout_secs() -> u64 {
        30
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::new(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryConfig {
    /// Log level or `EnvFilter` directive string.
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
