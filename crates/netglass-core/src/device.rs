//! Device and credential types
//!
//! The registry is resolved by the surrounding application; the execution
//! engine only borrows a [`Device`] for the duration of one call.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// Secret material used for authentication and token signing
///
/// The wrapped value is only reachable through [`Secret::reveal`], called at
/// the point of use. `Debug` and `Display` both redact, so the value cannot
/// leak into structured log records.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap raw secret material
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Reveal the secret for use in authentication or signing
    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Login credential for a device or proxy
#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
    /// Username presented to the device
    pub username: String,
    /// Password, which doubles as the token signing key on REST platforms
    pub password: Secret,
}

/// TLS settings for REST-capable devices
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Whether the device endpoint speaks HTTPS
    #[serde(default)]
    pub enabled: bool,
    /// Trust bundle the connection is pinned to instead of system roots
    pub cert: Option<PathBuf>,
}

/// A single queryable device
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    /// Unique location identifier
    pub name: String,
    /// Human-facing name used in error messages
    pub display_name: String,
    /// IP address or hostname
    pub address: String,
    /// SSH or HTTP port
    pub port: u16,
    /// Platform identifier (`cisco_ios`, `frr`, ...)
    pub platform: String,
    /// Login credential for the device itself
    pub credential: Credential,
    /// Jump host for devices without direct reachability
    pub proxy: Option<Box<Device>>,
    /// TLS settings, REST platforms only
    pub tls: Option<TlsConfig>,
}

/// Device registry keyed by location identifier
#[derive(Debug, Default)]
pub struct Devices {
    devices: HashMap<String, Device>,
}

impl Devices {
    /// Build a registry from configured devices
    #[must_use]
    pub fn new(devices: Vec<Device>) -> Self {
        let devices = devices.into_iter().map(|d| (d.name.clone(), d)).collect();
        Self { devices }
    }

    /// Look up a device by its location identifier
    #[must_use]
    pub fn device_by_location(&self, location: &str) -> Option<&Device> {
        self.devices.get(location)
    }

    /// Number of registered devices
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
