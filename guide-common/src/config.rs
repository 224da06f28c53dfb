//! Configuration file loading and setting resolution
//!
//! Settings resolve with the priority order: command-line argument →
//! environment variable → TOML config file → compiled default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// TOML configuration file contents (`~/.config/guide/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the remote photo classifier (`POST {base}/predict`)
    pub classifier_url: Option<String>,
    /// Base URL of the guide backend serving `GET /landmarks`
    pub directory_url: Option<String>,
    /// Port the identification service listens on
    pub listen_port: Option<u16>,
    /// Remote classification timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// host:port probed to detect network reachability
    pub probe_addr: Option<String>,
    /// Seconds between reachability probes
    pub probe_interval_secs: Option<u64>,
    /// Log filter (e.g. "info", "guide_ident=debug")
    pub log_level: Option<String>,
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("guide").join("config.toml"))
}

/// Load a TOML config file; a missing file yields defaults.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(TomlConfig::default()),
        },
    };

    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file found, using defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    tracing::info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Resolve a single string setting following the priority order.
pub fn resolve_string(
    cli: Option<&str>,
    env_var: &str,
    toml_value: Option<&str>,
    default: &str,
) -> String {
    if let Some(v) = cli {
        return v.to_string();
    }
    if let Ok(v) = std::env::var(env_var) {
        if !v.trim().is_empty() {
            return v;
        }
    }
    if let Some(v) = toml_value {
        return v.to_string();
    }
    default.to_string()
}

/// Resolve a single numeric setting following the priority order.
pub fn resolve_u64(cli: Option<u64>, env_var: &str, toml_value: Option<u64>, default: u64) -> u64 {
    if let Some(v) = cli {
        return v;
    }
    if let Ok(v) = std::env::var(env_var) {
        if let Ok(parsed) = v.trim().parse() {
            return parsed;
        }
    }
    toml_value.unwrap_or(default)
}
