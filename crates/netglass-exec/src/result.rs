//! Execution result types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Concrete path a query took to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportRoute {
    /// Interactive session straight to the device
    Direct,
    /// Interactive session through a jump-host tunnel
    Tunneled,
    /// Token-secured HTTP API
    Rest,
}

impl TransportRoute {
    /// Short name for log fields
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Tunneled => "tunneled",
            Self::Rest => "rest",
        }
    }
}

impl fmt::Display for TransportRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized outcome of one execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Joined command output
    pub output: String,
    /// Transport that produced it
    pub route: TransportRoute,
    /// Time from transport resolution to completion
    pub duration: Duration,
}

/// Join per-command outputs in input order with a blank line
///
/// Order is significant and preserved; this is the single join point
/// every transport goes through.
#[must_use]
pub fn join_responses(responses: &[String]) -> String {
    responses.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_preserves_input_order() {
        let joined = join_responses(&["X".to_string(), "Y".to_string()]);
        assert_eq!(joined, "X\n\nY");
    }

    #[test]
    fn test_join_single_response_is_untouched() {
        let joined = join_responses(&["Cisco IOS".to_string()]);
        assert_eq!(joined, "Cisco IOS");
    }

    #[test]
    fn test_join_empty_outputs_collapse() {
        assert_eq!(join_responses(&[]), "");
        assert_eq!(
            join_responses(&[String::new(), String::new()]),
            "\n\n"
        );
    }

    #[test]
    fn test_route_display() {
        assert_eq!(TransportRoute::Direct.to_string(), "direct");
        assert_eq!(TransportRoute::Tunneled.to_string(), "tunneled");
        assert_eq!(TransportRoute::Rest.to_string(), "rest");
    }
}
