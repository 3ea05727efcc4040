//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{GatewayError, Result};

/// Upper bound for `server.max_payload_bytes` (16 MiB)
pub const MAX_PAYLOAD_LIMIT: usize = 16 * 1024 * 1024;

/// Log levels accepted in `logging.level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rolling log files; empty logs to stderr
    #[serde(default)]
    pub directory: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

// Default value functions
fn default_bind() -> String { "0.0.0.0:8080".to_string() }
fn default_max_payload_bytes() -> usize { 64 * 1024 }

fn default_log_level() -> String { "info".to_string() }
fn default_file_prefix() -> String { "obd2-gateway.log".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            file_prefix: default_file_prefix(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use obd2_gateway::config::Config;
    ///
    /// let config = Config::load("config/gateway.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed bind address
    ///
    /// # Errors
    ///
    /// Returns error if `server.bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|e| {
            GatewayError::Config(toml::de::Error::custom(format!(
                "bind {:?} is not a socket address: {}",
                self.server.bind, e
            )))
        })
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.server.max_payload_bytes == 0 || self.server.max_payload_bytes > MAX_PAYLOAD_LIMIT {
            return Err(GatewayError::Config(
                toml::de::Error::custom(format!("max_payload_bytes must be between 1 and {}", MAX_PAYLOAD_LIMIT))
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(GatewayError::Config(
                toml::de::Error::custom("log level must be one of: trace, debug, info, warn, error")
            ));
        }

        if !self.logging.directory.is_empty() && self.logging.file_prefix.is_empty() {
            return Err(GatewayError::Config(
                toml::de::Error::custom("logging file_prefix cannot be empty when directory is set")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(toml_content: &str) -> Result<Config> {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        Config::load(temp_file.path())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_load_config_from_file() {
        let config = load_str(
            r#"
[server]
bind = "127.0.0.1:9000"
max_payload_bytes = 1024

[logging]
level = "debug"
directory = "/var/log/obd2"
"#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.server.max_payload_bytes, 1024);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.directory, "/var/log/obd2");
        assert_eq!(config.logging.file_prefix, "obd2-gateway.log");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = load_str("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.max_payload_bytes, 65536);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.directory.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load("/nonexistent/obd2-gateway.toml");
        assert!(matches!(result, Err(GatewayError::Io(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = load_str("[server\nbind = ");
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_invalid_bind() {
        let mut config = Config::default();
        config.server.bind = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_payload_zero() {
        let mut config = Config::default();
        config.server.max_payload_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_payload_too_high() {
        let mut config = Config::default();
        config.server.max_payload_bytes = MAX_PAYLOAD_LIMIT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_log_levels() {
        for level in LOG_LEVELS {
            let mut config = Config::default();
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "Log level {} should be valid", level);
        }
    }

    #[test]
    fn test_empty_file_prefix_with_directory() {
        let mut config = Config::default();
        config.logging.directory = "./logs".to_string();
        config.logging.file_prefix = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_file_prefix_without_directory() {
        let mut config = Config::default();
        config.logging.file_prefix = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_bind(), "0.0.0.0:8080");
        assert_eq!(default_max_payload_bytes(), 65536);
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_file_prefix(), "obd2-gateway.log");
    }
}
