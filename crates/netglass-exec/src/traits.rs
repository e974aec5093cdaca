//! Transport abstraction
//!
//! The coordinator only speaks to transports through [`QueryTransport`]
//! and obtains them through a [`TransportFactory`]. Production wiring is
//! [`DefaultTransportFactory`]; tests substitute mocks.

use async_trait::async_trait;

use netglass_core::{Device, QueryError};

use crate::deadline::Deadline;
use crate::rest::RestExecutor;
use crate::result::TransportRoute;
use crate::ssh::DirectExecutor;
use crate::tunnel::TunneledExecutor;

/// One transport invocation against one device
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Run `commands` in order and return their joined output
    ///
    /// # Errors
    /// Returns the [`QueryError`] kind matching the failure at the point
    /// of occurrence; never a partial response.
    async fn run(&self, commands: &[String], deadline: Deadline) -> Result<String, QueryError>;
}

/// Builds the transport for a resolved route
pub trait TransportFactory: Send + Sync {
    /// Construct the executor serving `route` for `device`
    ///
    /// # Errors
    /// Returns [`QueryError::Transport`] if the device record cannot back
    /// the route (a tunneled route on a device without a proxy).
    fn build(
        &self,
        device: &Device,
        route: TransportRoute,
    ) -> Result<Box<dyn QueryTransport>, QueryError>;
}

/// Production factory wiring routes to the russh/reqwest executors
#[derive(Debug, Default)]
pub struct DefaultTransportFactory;

impl TransportFactory for DefaultTransportFactory {
    fn build(
        &self,
        device: &Device,
        route: TransportRoute,
    ) -> Result<Box<dyn QueryTransport>, QueryError> {
        match route {
            TransportRoute::Direct => Ok(Box::new(DirectExecutor::new(device))),
            TransportRoute::Tunneled => match device.proxy.as_deref() {
                Some(proxy) => Ok(Box::new(TunneledExecutor::new(device, proxy))),
                None => Err(QueryError::Transport {
                    device: device.display_name.clone(),
                    proxy: None,
                    detail: "tunneled route resolved without a proxy".to_string(),
                }),
            },
            TransportRoute::Rest => Ok(Box::new(RestExecutor::new(device))),
        }
    }
}
