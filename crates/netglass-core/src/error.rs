//! Error taxonomy shared by all transports
//!
//! Every transport translates its protocol-specific failures into exactly
//! one of these kinds at the point of occurrence; outer layers never
//! re-wrap. The coordinator adds only the shared empty-output check.

use thiserror::Error;

use crate::config::Messages;

/// Terminal failure conditions for one execution
///
/// Each variant carries the device display name, the proxy name where one
/// was involved, and a human-readable detail string.
#[derive(Error, Debug, Clone)]
pub enum QueryError {
    /// Platform identifier is not in the support table
    #[error("unsupported platform {platform} on {device}")]
    UnsupportedPlatform {
        /// Device display name
        device: String,
        /// Offending platform identifier
        platform: String,
    },

    /// SSH or tunnel authentication was rejected
    #[error("authentication failed for {device}: {detail}")]
    Auth {
        /// Device display name
        device: String,
        /// Proxy display name, when the session ran through one
        proxy: Option<String>,
        /// Underlying rejection detail
        detail: String,
    },

    /// The per-request deadline elapsed
    #[error("request to {device} timed out: {detail}")]
    Timeout {
        /// Device display name
        device: String,
        /// Proxy display name, when the session ran through one
        proxy: Option<String>,
        /// What was in flight when the deadline expired
        detail: String,
    },

    /// SSH or tunnel protocol/connection error
    #[error("transport error for {device}: {detail}")]
    Transport {
        /// Device display name
        device: String,
        /// Proxy display name; set for tunnel setup failures
        proxy: Option<String>,
        /// Underlying transport detail
        detail: String,
    },

    /// HTTP-level or connection error, including non-200 status
    #[error("REST error for {device}: {detail}")]
    Rest {
        /// Device display name
        device: String,
        /// Underlying HTTP or decode detail
        detail: String,
    },

    /// Device was reachable but produced no usable output
    #[error("empty response from {device}")]
    EmptyResponse {
        /// Device display name
        device: String,
    },
}

impl QueryError {
    /// Display name of the device the failure is attributed to
    #[must_use]
    pub fn device(&self) -> &str {
        match self {
            Self::UnsupportedPlatform { device, .. }
            | Self::Auth { device, .. }
            | Self::Timeout { device, .. }
            | Self::Transport { device, .. }
            | Self::Rest { device, .. }
            | Self::EmptyResponse { device } => device,
        }
    }

    /// Proxy involved in the failure, if any
    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        match self {
            Self::Auth { proxy, .. }
            | Self::Timeout { proxy, .. }
            | Self::Transport { proxy, .. } => proxy.as_deref(),
            _ => None,
        }
    }

    /// Render the user-facing message template configured for this kind
    ///
    /// Substitutes `{device_name}`, `{proxy}`, `{error}` and `{platform}`
    /// placeholders. The detail strings here are descriptive, not part of
    /// the execution contract.
    #[must_use]
    pub fn user_message(&self, messages: &Messages) -> String {
        let template = match self {
            Self::UnsupportedPlatform { .. } => &messages.unsupported_platform,
            Self::Auth { .. } => &messages.authentication_error,
            Self::Timeout { .. } => &messages.request_timeout,
            Self::Transport { .. } | Self::Rest { .. } => &messages.connection_error,
            Self::EmptyResponse { .. } => &messages.no_output,
        };

        let detail = match self {
            Self::Auth { detail, .. }
            | Self::Timeout { detail, .. }
            | Self::Transport { detail, .. }
            | Self::Rest { detail, .. } => detail.as_str(),
            _ => "",
        };
        let platform = match self {
            Self::UnsupportedPlatform { platform, .. } => platform.as_str(),
            _ => "",
        };

        template
            .replace("{device_name}", self.device())
            .replace("{proxy}", self.proxy().unwrap_or(""))
            .replace("{error}", detail)
            .replace("{platform}", platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_and_proxy_accessors() {
        let err = QueryError::Transport {
            device: "Amsterdam".to_string(),
            proxy: Some("ams-jump".to_string()),
            detail: "connection reset".to_string(),
        };
        assert_eq!(err.device(), "Amsterdam");
        assert_eq!(err.proxy(), Some("ams-jump"));

        let err = QueryError::EmptyResponse {
            device: "Amsterdam".to_string(),
        };
        assert_eq!(err.proxy(), None);
    }

    #[test]
    fn test_user_message_substitution() {
        let messages = Messages::default();
        let err = QueryError::EmptyResponse {
            device: "Amsterdam".to_string(),
        };
        let rendered = err.user_message(&messages);
        assert!(rendered.contains("Amsterdam"));
        assert!(!rendered.contains("{device_name}"));
    }

    #[test]
    fn test_user_message_picks_kind_template() {
        let mut messages = Messages::default();
        messages.request_timeout = "slow: {device_name}".to_string();
        let err = QueryError::Timeout {
            device: "sfo1".to_string(),
            proxy: None,
            detail: "deadline exceeded".to_string(),
        };
        assert_eq!(err.user_message(&messages), "slow: sfo1");
    }
}
