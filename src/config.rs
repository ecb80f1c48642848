//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable that overrides the listen port.
pub const PORT_VAR: &str = "PORT";

/// Configuration for the coordinator process.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    port: u16,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    log_filter: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_filter() -> String {
    "info,strictly_gomoku=debug".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(default_host(), default_port())
    }
}

impl ServerConfig {
    /// Creates a configuration with the default log filter.
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            log_filter: default_log_filter(),
        }
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file when it exists, then applies the `PORT` variable.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            Self::from_file(path)?
        } else {
            debug!("Config file not found, using defaults");
            Self::default()
        };
        config.with_port_var(std::env::var(PORT_VAR).ok())
    }

    /// Overrides the port from a raw `PORT` value.
    pub fn with_port_var(mut self, value: Option<String>) -> Result<Self, ConfigError> {
        if let Some(raw) = value {
            self.port = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid {} value {:?}: {}", PORT_VAR, raw, e)))?;
            debug!(port = self.port, "Port taken from environment");
        }
        Ok(self)
    }

    /// Applies command-line overrides.
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 4100").unwrap();
        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port(), &4100);
        assert_eq!(config.host(), "127.0.0.1");
    }

    #[test]
    fn test_bad_toml_reports_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        let err = ServerConfig::from_file(file.path()).unwrap_err();
        assert!(err.message.contains("Failed to parse config"));
    }

    #[test]
    fn test_unreadable_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::from_file(dir.path().join("absent.toml"));
        assert!(config.is_err());
    }

    #[test]
    fn test_port_var_overrides() {
        let config = ServerConfig::default()
            .with_port_var(Some("8080".into()))
            .unwrap();
        assert_eq!(config.port(), &8080);
        assert!(ServerConfig::default().with_port_var(Some("eighty".into())).is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = ServerConfig::default().with_overrides(Some("0.0.0.0".into()), Some(9000));
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.port(), &9000);
    }
}
