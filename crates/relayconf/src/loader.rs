//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, RelayConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local). Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/toolrelay/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("toolrelay/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("toolrelay.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and overlay the keys it sets onto `config`.
pub fn apply_file(config: &mut RelayConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Overlay keys from a TOML document. Keys the document doesn't set keep
/// their current value, so files layer field by field.
fn apply_toml(config: &mut RelayConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let wrong_type = |key: &str, expected: &str| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("`{}` must be {}", key, expected),
    };

    if let Some(model) = table.get("model").and_then(|v| v.as_table()) {
        if let Some(v) = model.get("endpoint") {
            config.model.endpoint = v
                .as_str()
                .ok_or_else(|| wrong_type("model.endpoint", "a string"))?
                .to_string();
        }
        if let Some(v) = model.get("token") {
            config.model.token = Some(
                v.as_str()
                    .ok_or_else(|| wrong_type("model.token", "a string"))?
                    .to_string(),
            );
        }
        if let Some(v) = model.get("insecure_skip_verify") {
            config.model.insecure_skip_verify = v
                .as_bool()
                .ok_or_else(|| wrong_type("model.insecure_skip_verify", "a boolean"))?;
        }
        if let Some(v) = model.get("timeout_secs") {
            config.model.timeout_secs = v
                .as_integer()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| wrong_type("model.timeout_secs", "a non-negative integer"))?;
        }
    }

    if let Some(tools) = table.get("tools").and_then(|v| v.as_table()) {
        if let Some(v) = tools.get("command") {
            config.tools.command = expand_path(
                v.as_str()
                    .ok_or_else(|| wrong_type("tools.command", "a string"))?,
            );
        }
        if let Some(v) = tools.get("timeout_secs") {
            config.tools.timeout_secs = v
                .as_integer()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| wrong_type("tools.timeout_secs", "a non-negative integer"))?;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level") {
            config.telemetry.log_level = v
                .as_str()
                .ok_or_else(|| wrong_type("telemetry.log_level", "a string"))?
                .to_string();
        }
    }

    Ok(())
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut RelayConfig, sources: &mut ConfigSources) {
    apply_env_overrides_from(config, sources, env::vars());
}

/// Apply overrides from an explicit set of variables.
pub fn apply_env_overrides_from<I>(config: &mut RelayConfig, sources: &mut ConfigSources, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut rust_log = None;

    for (key, value) in vars {
        let applied = match key.as_str() {
            "TOOLRELAY_MODEL_ENDPOINT" => {
                config.model.endpoint = value;
                true
            }
            "TOOLRELAY_MODEL_TOKEN" => {
                config.model.token = Some(value);
                true
            }
            "TOOLRELAY_TLS_INSECURE" => match parse_bool(&value) {
                Some(b) => {
                    config.model.insecure_skip_verify = b;
                    true
                }
                None => false,
            },
            "TOOLRELAY_MODEL_TIMEOUT_SECS" => match value.parse() {
                Ok(secs) => {
                    config.model.timeout_secs = secs;
                    true
                }
                Err(_) => false,
            },
            "TOOLRELAY_TOOL_COMMAND" => {
                config.tools.command = expand_path(&value);
                true
            }
            "TOOLRELAY_TOOL_TIMEOUT_SECS" => match value.parse() {
                Ok(secs) => {
                    config.tools.timeout_secs = secs;
                    true
                }
                Err(_) => false,
            },
            "TOOLRELAY_LOG_LEVEL" => {
                config.telemetry.log_level = value;
                true
            }
            "RUST_LOG" => {
                // Applied last so it wins over TOOLRELAY_LOG_LEVEL regardless of order
                rust_log = Some(value);
                false
            }
            _ => false,
        };

        if applied {
            sources.env_overrides.push(key);
        }
    }

    if let Some(value) = rust_log {
        config.telemetry.log_level = value;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
