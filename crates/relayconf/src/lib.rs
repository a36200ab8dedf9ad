//! Configuration loading for toolrelay.
//!
//! Everything the orchestrator needs from the outside world lives here: the
//! model endpoint and its credential, the tool server executable, the
//! transport timeouts, and the log level.
//!
//! # Usage
//!
//! ```rust,no_run
//! use relayconf::RelayConfig;
//!
//! let config = RelayConfig::load().expect("Failed to load config");
//! config.validate().expect("Incomplete config");
//!
//! println!("Model endpoint: {}", config.model.endpoint);
//! println!("Tool server: {}", config.tools.command.display());
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/toolrelay/config.toml` (system)
//! 2. `~/.config/toolrelay/config.toml` (user)
//! 3. `./toolrelay.toml` (local override, replaced by an explicit path)
//! 4. Environment variables (`TOOLRELAY_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [model]
//! endpoint = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
//! token = "..."
//! insecure_skip_verify = false
//! timeout_secs = 60
//!
//! [tools]
//! command = "~/bin/hello-mcp"
//! timeout_secs = 30
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files, discover_config_files_with_override, ConfigSources};
pub use sections::{ModelConfig, TelemetryConfig, ToolsConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing required setting `{0}`")]
    Missing(&'static str),

    #[error("Setting `{0}` must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Complete toolrelay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RelayConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl RelayConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, with `config_path` replacing `./toolrelay.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return where values came from.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = RelayConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::apply_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Check that the settings without usable defaults are present and the
    /// timeouts are non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("model.endpoint"));
        }
        if self.tools.command.as_os_str().is_empty() {
            return Err(ConfigError::Missing("tools.command"));
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("model.timeout_secs"));
        }
        if self.tools.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("tools.timeout_secs"));
        }
        Ok(())
    }

    /// Serialize config to TOML, with the credential redacted.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# toolrelay configuration\n\n");

        output.push_str("[model]\n");
        output.push_str(&format!("endpoint = \"{}\"\n", self.model.endpoint));
        if self.model.token.is_some() {
            output.push_str("token = \"<redacted>\"\n");
        }
        output.push_str(&format!(
            "insecure_skip_verify = {}\n",
            self.model.insecure_skip_verify
        ));
        output.push_str(&format!("timeout_secs = {}\n", self.model.timeout_secs));

        output.push_str("\n[tools]\n");
        output.push_str(&format!(
            "command = \"{}\"\n",
            self.tools.command.display()
        ));
        output.push_str(&format!("timeout_secs = {}\n", self.tools.timeout_secs));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = \"{}\"\n",
            self.telemetry.log_level
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.model.timeout_secs, 60);
        assert_eq!(config.tools.timeout_secs, 30);
        assert!(!config.model.insecure_skip_verify);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_validate_requires_endpoint_and_command() {
        let mut config = RelayConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("model.endpoint"))
        ));

        config.model.endpoint = "https://example.test/generate".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("tools.command"))
        ));

        config.tools.command = PathBuf::from("/usr/local/bin/hello-mcp");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = RelayConfig::default();
        config.model.endpoint = "https://example.test/generate".to_string();
        config.tools.command = PathBuf::from("/usr/local/bin/hello-mcp");

        config.model.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout("model.timeout_secs")));
        assert!(err.to_string().contains("model.timeout_secs"));

        config.model.timeout_secs = 60;
        config.tools.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroTimeout("tools.timeout_secs"))
        ));
    }

    #[test]
    fn test_to_toml_redacts_token() {
        let mut config = RelayConfig::default();
        config.model.token = Some("sekrit".to_string());
        let toml = config.to_toml();
        assert!(toml.contains("[model]"));
        assert!(toml.contains("[tools]"));
        assert!(toml.contains("token = \"<redacted>\""));
        assert!(!toml.contains("sekrit"));
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = RelayConfig::default();
        config.model.endpoint = "https://example.test/generate".to_string();
        config.tools.command = PathBuf::from("/opt/tools/hello-mcp");

        let parsed: RelayConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed, config);
    }
}
