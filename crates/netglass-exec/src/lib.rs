//! netglass-exec: multi-transport query execution
//!
//! Drives a validated query against a network device over direct SSH, an
//! SSH tunnel through a jump host, or a token-secured HTTP API, under one
//! deadline and one error taxonomy.

pub mod coordinator;
pub mod deadline;
pub mod rest;
pub mod result;
pub mod ssh;
pub mod token;
pub mod traits;
pub mod tunnel;

pub use coordinator::{Coordinator, resolve_route};
pub use deadline::Deadline;
pub use rest::RestExecutor;
pub use result::{ExecutionResult, TransportRoute, join_responses};
pub use ssh::DirectExecutor;
pub use token::{Envelope, TokenError, decode_payload, encode_payload};
pub use traits::{DefaultTransportFactory, QueryTransport, TransportFactory};
pub use tunnel::{LocalForward, TunneledExecutor};
