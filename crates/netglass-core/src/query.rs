//! Validated query input

use serde::Deserialize;

/// A validated query plus the commands constructed for it
///
/// Command construction happens upstream; the engine issues the commands
/// verbatim, in order, and never derives device syntax from the type and
/// target pair. Output order follows command order.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// Location identifier of the target device
    pub query_location: String,
    /// Query type, e.g. `bgp_route`
    pub query_type: String,
    /// Query target, e.g. a prefix or hostname
    pub query_target: String,
    /// Ordered command strings to issue
    pub commands: Vec<String>,
}
