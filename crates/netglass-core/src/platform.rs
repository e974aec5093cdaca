//! Platform support table and transport selection
//!
//! Maps a device's platform identifier onto the transport class that can
//! query it. Unrecognized platforms are rejected up front rather than
//! falling through to a default transport.

use serde::{Deserialize, Serialize};

/// Transport class a platform is queried over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// HTTP API speaking the signed token envelope
    Rest,
    /// Interactive command-line session, direct or through a proxy tunnel
    Scrape,
}

/// Platforms queried over the REST transport
pub const REST_PLATFORMS: &[&str] = &["bird", "frr"];

/// Platforms queried over an interactive session
pub const SCRAPE_PLATFORMS: &[&str] = &[
    "arista_eos",
    "cisco_ios",
    "cisco_xr",
    "huawei",
    "juniper",
    "mikrotik_routeros",
    "vyos",
];

/// Look up the transport class for a platform identifier
///
/// Returns `None` for platforms outside the support table; callers are
/// expected to fail fast with an unsupported-platform error.
#[must_use]
pub fn map_transport(platform: &str) -> Option<TransportKind> {
    if REST_PLATFORMS.contains(&platform) {
        Some(TransportKind::Rest)
    } else if SCRAPE_PLATFORMS.contains(&platform) {
        Some(TransportKind::Scrape)
    } else {
        None
    }
}

/// Whether `platform` is queried over REST
#[must_use]
pub fn is_rest(platform: &str) -> bool {
    map_transport(platform) == Some(TransportKind::Rest)
}

/// Whether `platform` is queried over an interactive session
#[must_use]
pub fn is_scrape(platform: &str) -> bool {
    map_transport(platform) == Some(TransportKind::Scrape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_rest_platform_maps_to_rest() {
        for platform in REST_PLATFORMS {
            assert_eq!(map_transport(platform), Some(TransportKind::Rest));
            assert!(is_rest(platform));
            assert!(!is_scrape(platform));
        }
    }

    #[test]
    fn test_every_scrape_platform_maps_to_scrape() {
        for platform in SCRAPE_PLATFORMS {
            assert_eq!(map_transport(platform), Some(TransportKind::Scrape));
            assert!(is_scrape(platform));
            assert!(!is_rest(platform));
        }
    }

    #[test]
    fn test_mapping_is_stable_across_calls() {
        for platform in REST_PLATFORMS.iter().chain(SCRAPE_PLATFORMS) {
            assert_eq!(map_transport(platform), map_transport(platform));
        }
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        for platform in ["cisco_nxos", "windows", "", "FRR"] {
            assert_eq!(map_transport(platform), None);
        }
    }
}
