//! netglass-core: shared types for the query execution engine
//!
//! Holds the configuration surface, the device/credential model, the
//! platform support table and the error taxonomy shared by every transport.

pub mod config;
pub mod device;
pub mod error;
pub mod platform;
pub mod query;

pub use config::{Config, ConfigError, Messages, Params};
pub use device::{Credential, Device, Devices, Secret, TlsConfig};
pub use error::QueryError;
pub use platform::TransportKind;
pub use query::QueryRequest;
