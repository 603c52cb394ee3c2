//! Configuration resolution for sahayak-planner
//!
//! Each setting resolves with priority CLI → ENV → TOML → compiled default.

use reqwest::Url;
use sahayak_common::config::{env_override, CompiledDefaults, TomlConfig};
use sahayak_common::{Error, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::services::ContentServiceConfig;

pub const ENV_HOST: &str = "SAHAYAK_HOST";
pub const ENV_PORT: &str = "SAHAYAK_PORT";
pub const ENV_CONTENT_SERVICE_URL: &str = "SAHAYAK_CONTENT_SERVICE_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "SAHAYAK_REQUEST_TIMEOUT_SECS";
pub const ENV_MAX_IMAGE_BYTES: &str = "SAHAYAK_MAX_IMAGE_BYTES";
pub const ENV_FRONTEND_ORIGIN: &str = "SAHAYAK_FRONTEND_ORIGIN";
pub const ENV_SESSION_IDLE_TIMEOUT_SECS: &str = "SAHAYAK_SESSION_IDLE_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "SAHAYAK_LOG_LEVEL";
/// Set by GitHub Codespaces; used to derive the forwarded frontend origin
pub const ENV_CODESPACE_NAME: &str = "CODESPACE_NAME";

/// Port the frontend dev server listens on
const FRONTEND_DEV_PORT: u16 = 5173;

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub content_service_url: Option<String>,
    pub session_idle_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub bind_addr: SocketAddr,
    pub content_service: ContentServiceConfig,
    pub max_image_bytes: usize,
    pub frontend_origin: String,
    pub session_idle_timeout: Duration,
    pub log_level: String,
}

impl PlannerConfig {
    /// Resolve every setting from its sources
    pub fn resolve(cli: &CliOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::default();

        let host: String = resolve_setting(
            "host",
            cli.host.clone(),
            ENV_HOST,
            toml_config.host.clone(),
            defaults.host,
        )?;
        let port: u16 = resolve_setting(
            "port",
            cli.port,
            ENV_PORT,
            toml_config.port,
            defaults.port,
        )?;
        let bind_addr = SocketAddr::from_str(&format!("{}:{}", host, port))
            .map_err(|e| Error::Config(format!("Invalid bind address {}:{}: {}", host, port, e)))?;

        let service_url: String = resolve_setting(
            "content_service_url",
            cli.content_service_url.clone(),
            ENV_CONTENT_SERVICE_URL,
            toml_config.content_service_url.clone(),
            defaults.content_service_url,
        )?;
        let base_url = parse_service_url(&service_url)?;

        let timeout_secs: u64 = resolve_setting(
            "request_timeout_secs",
            None,
            ENV_REQUEST_TIMEOUT_SECS,
            toml_config.request_timeout_secs,
            defaults.request_timeout_secs,
        )?;
        if timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".to_string()));
        }

        let max_image_bytes: usize = resolve_setting(
            "max_image_bytes",
            None,
            ENV_MAX_IMAGE_BYTES,
            toml_config.max_image_bytes,
            defaults.max_image_bytes,
        )?;

        let frontend_origin = match env_override(ENV_CODESPACE_NAME) {
            Some(codespace) if env_override(ENV_FRONTEND_ORIGIN).is_none()
                && toml_config.frontend_origin.is_none() =>
            {
                let origin = codespace_origin(&codespace);
                info!("CORS: allowing Codespaces origin {}", origin);
                origin
            }
            _ => resolve_setting(
                "frontend_origin",
                None,
                ENV_FRONTEND_ORIGIN,
                toml_config.frontend_origin.clone(),
                defaults.frontend_origin,
            )?,
        };

        let idle_secs: u64 = resolve_setting(
            "session_idle_timeout_secs",
            cli.session_idle_timeout_secs,
            ENV_SESSION_IDLE_TIMEOUT_SECS,
            toml_config.session_idle_timeout_secs,
            defaults.session_idle_timeout_secs,
        )?;
        if idle_secs == 0 {
            return Err(Error::Config("session_idle_timeout_secs must be positive".to_string()));
        }

        let log_level: String = resolve_setting(
            "log_level",
            cli.log_level.clone(),
            ENV_LOG_LEVEL,
            Some(toml_config.logging.level.clone()),
            defaults.log_level,
        )?;

        Ok(Self {
            bind_addr,
            content_service: ContentServiceConfig::new(base_url, Duration::from_secs(timeout_secs)),
            max_image_bytes,
            frontend_origin,
            session_idle_timeout: Duration::from_secs(idle_secs),
            log_level,
        })
    }

    /// How often idle sessions are looked for
    ///
    /// A quarter of the idle timeout, between one second and one minute.
    pub fn session_reap_period(&self) -> Duration {
        (self.session_idle_timeout / 4).clamp(Duration::from_secs(1), Duration::from_secs(60))
    }
}

/// Forwarded URL of the frontend dev server inside a Codespace
pub fn codespace_origin(codespace_name: &str) -> String {
    format!("https://{}-{}.app.github.dev", codespace_name, FRONTEND_DEV_PORT)
}

/// Validate the content service base URL (http or https only)
pub fn parse_service_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::Config(format!("Invalid content service URL {:?}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "Content service URL must use http or https, got {}",
            other
        ))),
    }
}

fn resolve_setting<T>(
    name: &str,
    cli_value: Option<T>,
    env_var: &str,
    toml_value: Option<T>,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = cli_value {
        debug!("{} taken from command line", name);
        return Ok(value);
    }

    if let Some(raw) = env_override(env_var) {
        debug!("{} taken from environment variable {}", name, env_var);
        return raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {}={:?}: {}", env_var, raw, e)));
    }

    if let Some(value) = toml_value {
        debug!("{} taken from TOML config", name);
        return Ok(value);
    }

    Ok(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_url() {
        assert!(parse_service_url("http://localhost:8000").is_ok());
        assert!(parse_service_url("https://api.example.org").is_ok());
        assert!(parse_service_url("ftp://files.example.org").is_err());
        assert!(parse_service_url("not a url").is_err());
    }

    #[test]
    fn test_codespace_origin() {
        assert_eq!(
            codespace_origin("fuzzy-robot"),
            "https://fuzzy-robot-5173.app.github.dev"
        );
    }
}
