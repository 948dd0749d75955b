//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session token settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the JSON dataset file.
    #[serde(default = "default_store_path")]
    pub path: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "rosterly_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Session token configuration.
///
/// The secret has no default on purpose: a fixed fallback would make
/// every unconfigured deployment share a signing key, so a missing
/// secret is a startup error instead.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret used to sign session tokens. Required.
    #[serde(default)]
    pub secret: String,

    /// Token lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_store_path() -> String {
    "db/data.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl() -> u64 {
    86_400
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_secs: default_session_ttl(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// No session secret was configured.
    #[error(
        "no session secret configured: set session.secret in the config file \
         or the ROSTERLY_SESSION_SECRET environment variable"
    )]
    MissingSessionSecret,
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `ROSTERLY_HOST` overrides `server.host`
/// - `ROSTERLY_PORT` overrides `server.port`
/// - `ROSTERLY_STORE_PATH` overrides `store.path`
/// - `ROSTERLY_LOG_LEVEL` overrides `logging.level`
/// - `ROSTERLY_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `ROSTERLY_SESSION_SECRET` overrides `session.secret`
/// - `ROSTERLY_SESSION_TTL_SECS` overrides `session.ttl_secs`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if no session secret is configured by either the file or the
/// environment.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("ROSTERLY_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("ROSTERLY_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(store_path) = std::env::var("ROSTERLY_STORE_PATH") {
        config.store.path = store_path;
    }
    if let Ok(level) = std::env::var("ROSTERLY_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("ROSTERLY_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(secret) = std::env::var("ROSTERLY_SESSION_SECRET") {
        config.session.secret = secret;
    }
    if let Ok(ttl) = std::env::var("ROSTERLY_SESSION_TTL_SECS") {
        if let Ok(parsed) = ttl.parse() {
            config.session.ttl_secs = parsed;
        }
    }

    if config.session.secret.trim().is_empty() {
        return Err(ConfigError::MissingSessionSecret);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
        file.write_all(contents.as_bytes())
            .expect("failed to write config");
        file
    }

    #[test]
    fn config_file_without_secret_is_rejected() {
        let file = write_config("[server]\nport = 4000\n");
        let err = load_config(file.path().to_str()).expect_err("missing secret must fail");
        assert!(matches!(err, ConfigError::MissingSessionSecret));
    }

    #[test]
    fn config_file_with_secret_loads() {
        let file = write_config(
            "[server]\nport = 4000\n\n[session]\nsecret = \"s3cret\"\n",
        );
        let config = load_config(file.path().to_str()).expect("failed to load config");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.session.secret, "s3cret");
        // Defaults fill in everything not specified.
        assert_eq!(config.session.ttl_secs, 86_400);
        assert_eq!(config.store.path, "db/data.json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn unparseable_config_file_is_an_error() {
        let file = write_config("not toml at all [");
        let err = load_config(file.path().to_str()).expect_err("bad toml must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
