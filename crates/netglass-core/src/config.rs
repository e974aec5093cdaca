//! Engine configuration
//!
//! Loaded once at startup and treated as immutable for the lifetime of the
//! process. The execution engine consumes the request timeout and the
//! user-facing message templates; devices feed the registry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::device::Device;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Engine parameters
    #[serde(default)]
    pub params: Params,
    /// Device registry entries
    #[serde(default)]
    pub device: Vec<Device>,
}

/// Engine parameters
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Hard wall-clock budget for one execution, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// User-facing message templates keyed by failure kind
    #[serde(default)]
    pub messages: Messages,
}

impl Params {
    /// Request timeout as a [`Duration`]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            messages: Messages::default(),
        }
    }
}

fn default_request_timeout() -> u64 {
    90
}

/// User-facing error message templates
///
/// `{device_name}`, `{proxy}`, `{error}` and `{platform}` are substituted
/// at render time.
#[derive(Debug, Clone, Deserialize)]
pub struct Messages {
    /// Platform outside the support table
    #[serde(default = "default_unsupported_platform")]
    pub unsupported_platform: String,
    /// SSH or tunnel authentication rejected
    #[serde(default = "default_authentication_error")]
    pub authentication_error: String,
    /// Deadline elapsed
    #[serde(default = "default_request_timeout_msg")]
    pub request_timeout: String,
    /// Transport or HTTP connection failure
    #[serde(default = "default_connection_error")]
    pub connection_error: String,
    /// Device reachable but no usable output
    #[serde(default = "default_no_output")]
    pub no_output: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            unsupported_platform: default_unsupported_platform(),
            authentication_error: default_authentication_error(),
            request_timeout: default_request_timeout_msg(),
            connection_error: default_connection_error(),
            no_output: default_no_output(),
        }
    }
}

fn default_unsupported_platform() -> String {
    "{platform} is not a supported platform for {device_name}.".to_string()
}

fn default_authentication_error() -> String {
    "Authentication failed when connecting to {device_name}.".to_string()
}

fn default_request_timeout_msg() -> String {
    "The request to {device_name} timed out.".to_string()
}

fn default_connection_error() -> String {
    "Error connecting to {device_name}: {error}".to_string()
}

fn default_no_output() -> String {
    "{device_name} returned an empty response.".to_string()
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File content is not valid configuration
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path that failed
        path: PathBuf,
        /// Underlying parse error
        source: toml::de::Error,
    },
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `NETGLASS_CONFIG` or the default search paths
    ///
    /// Falls back to built-in defaults when no file is found.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if a file was found but cannot be loaded.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("NETGLASS_CONFIG") {
            return Self::load(&PathBuf::from(path));
        }

        let paths = [
            PathBuf::from("netglass.toml"),
            PathBuf::from("/etc/netglass/netglass.toml"),
            dirs::config_dir()
                .map(|p| p.join("netglass/netglass.toml"))
                .unwrap_or_default(),
        ];

        for path in paths {
            if path.exists() {
                return Self::load(&path);
            }
        }

        tracing::warn!("no config file found, using defaults");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = Params::default();
        assert_eq!(params.request_timeout, 90);
        assert_eq!(params.timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.params.request_timeout, 90);
        assert!(config.device.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let raw = r#"
            [params]
            request_timeout = 30

            [params.messages]
            no_output = "nothing from {device_name}"

            [[device]]
            name = "sfo1"
            display_name = "San Francisco"
            address = "192.0.2.1"
            port = 22
            platform = "cisco_ios"

            [device.credential]
            username = "lg"
            password = "s3cr3t"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.params.request_timeout, 30);
        assert_eq!(config.params.messages.no_output, "nothing from {device_name}");
        // untouched templates keep their defaults
        assert_eq!(
            config.params.messages.connection_error,
            Messages::default().connection_error
        );
        assert_eq!(config.device.len(), 1);
        assert_eq!(config.device[0].platform, "cisco_ios");
    }
}
