//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup: a warning is logged
//! and compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "sahayak";

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// On-disk configuration file contents
///
/// Every field is optional so that partial files stay valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Host interface to bind the HTTP server to
    #[serde(default)]
    pub host: Option<String>,

    /// Port to bind the HTTP server to
    #[serde(default)]
    pub port: Option<u16>,

    /// Base URL of the remote content service (text extraction + generation)
    #[serde(default)]
    pub content_service_url: Option<String>,

    /// Timeout applied to each remote content service request
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Largest accepted syllabus image upload
    #[serde(default)]
    pub max_image_bytes: Option<usize>,

    /// Origin allowed to call the HTTP API from a browser
    #[serde(default)]
    pub frontend_origin: Option<String>,

    /// Idle time after which an abandoned workflow session is discarded
    #[serde(default)]
    pub session_idle_timeout_secs: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Compiled fallback values used when no other source provides a setting
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub host: String,
    pub port: u16,
    pub content_service_url: String,
    pub request_timeout_secs: u64,
    pub max_image_bytes: usize,
    pub frontend_origin: String,
    pub session_idle_timeout_secs: u64,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8100,
            content_service_url: "http://localhost:8000".to_string(),
            // Generation fans out to three model calls upstream
            request_timeout_secs: 120,
            max_image_bytes: 10 * 1024 * 1024,
            frontend_origin: "http://localhost:5173".to_string(),
            session_idle_timeout_secs: 60 * 60,
            log_level: default_log_level(),
        }
    }
}

/// Default TOML path for a module: `<config_dir>/sahayak/<module>.toml`
pub fn default_config_path(module_name: &str) -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(CONFIG_DIR_NAME).join(format!("{}.toml", module_name)))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Parse a TOML config file
///
/// Fails on unreadable or malformed files; see [`load_toml_config_or_default`]
/// for the startup path that degrades gracefully.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Load a TOML config file, falling back to defaults when it is missing or invalid
pub fn load_toml_config_or_default(path: &Path) -> TomlConfig {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using compiled defaults",
            path.display()
        );
        return TomlConfig::default();
    }

    match load_toml_config(path) {
        Ok(config) => {
            info!("Loaded configuration from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Read an environment variable, treating blank values as unset
pub fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Serialize and write a TOML config file, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_parses() {
        let config: TomlConfig = toml::from_str("port = 9000\n").unwrap();
        assert_eq!(config.port, Some(9000));
        assert!(config.content_service_url.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_config_path_names_module() {
        if let Ok(path) = default_config_path("sahayak-planner") {
            assert!(path.ends_with("sahayak/sahayak-planner.toml"));
        }
    }
}
