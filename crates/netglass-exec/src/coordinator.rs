//! Top-level execution entry point
//!
//! Resolves the transport route for a device, drives the matching executor
//! under the configured deadline and applies the shared empty-output check,
//! so individual transports need not duplicate it.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use netglass_core::{Device, Params, QueryError, QueryRequest, TransportKind, platform};

use crate::deadline::Deadline;
use crate::result::{ExecutionResult, TransportRoute};
use crate::traits::{DefaultTransportFactory, TransportFactory};

/// Resolve the concrete route for a device
///
/// Scrape platforms split on proxy presence at call time; platforms
/// outside the support table fail fast instead of falling through to a
/// default transport.
pub fn resolve_route(device: &Device) -> Result<TransportRoute, QueryError> {
    match platform::map_transport(&device.platform) {
        Some(TransportKind::Rest) => Ok(TransportRoute::Rest),
        Some(TransportKind::Scrape) if device.proxy.is_some() => Ok(TransportRoute::Tunneled),
        Some(TransportKind::Scrape) => Ok(TransportRoute::Direct),
        None => Err(QueryError::UnsupportedPlatform {
            device: device.display_name.clone(),
            platform: device.platform.clone(),
        }),
    }
}

/// Drives one query execution per call
///
/// Holds no cross-call mutable state; concurrent `execute` calls are
/// independent even against the same device.
pub struct Coordinator {
    params: Arc<Params>,
    factory: Arc<dyn TransportFactory>,
}

impl Coordinator {
    /// Coordinator with the production transport wiring
    #[must_use]
    pub fn new(params: Arc<Params>) -> Self {
        Self::with_factory(params, Arc::new(DefaultTransportFactory))
    }

    /// Coordinator with a custom transport factory
    #[must_use]
    pub fn with_factory(params: Arc<Params>, factory: Arc<dyn TransportFactory>) -> Self {
        Self { params, factory }
    }

    /// Execute `request` against `device`
    ///
    /// Single-shot: a failure is terminal for this call, and retry policy
    /// belongs to the caller.
    ///
    /// # Errors
    /// Returns the [`QueryError`] kind matching the terminal condition;
    /// resources opened before a failure are released before it surfaces.
    #[instrument(
        skip(self, request, device),
        fields(
            location = %request.query_location,
            query_type = %request.query_type,
            device = %device.name,
        )
    )]
    pub async fn execute(
        &self,
        request: &QueryRequest,
        device: &Device,
    ) -> Result<ExecutionResult, QueryError> {
        let route = resolve_route(device)?;
        debug!(route = %route, "transport resolved");

        let transport = self.factory.build(device, route)?;
        let deadline = Deadline::after(self.params.timeout());
        let start = Instant::now();

        let output = transport.run(&request.commands, deadline).await?;

        // every transport shares identical empty-output semantics
        if output.trim().is_empty() {
            return Err(QueryError::EmptyResponse {
                device: device.display_name.clone(),
            });
        }

        let duration = start.elapsed();
        debug!(route = %route, bytes = output.len(), ?duration, "query completed");

        Ok(ExecutionResult {
            output,
            route,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use netglass_core::{Credential, Secret};

    use super::*;

    fn device(platform: &str, proxied: bool) -> Device {
        let proxy = proxied.then(|| {
            Box::new(Device {
                name: "jump1".to_string(),
                display_name: "Jump Host".to_string(),
                address: "198.51.100.4".to_string(),
                port: 22,
                platform: "linux_ssh".to_string(),
                credential: Credential {
                    username: "jump".to_string(),
                    password: Secret::new("pr0xy"),
                },
                proxy: None,
                tls: None,
            })
        });
        Device {
            name: "sfo1".to_string(),
            display_name: "San Francisco".to_string(),
            address: "192.0.2.1".to_string(),
            port: 22,
            platform: platform.to_string(),
            credential: Credential {
                username: "lg".to_string(),
                password: Secret::new("hunter2"),
            },
            proxy,
            tls: None,
        }
    }

    #[test]
    fn test_scrape_platform_without_proxy_routes_direct() {
        for platform in platform::SCRAPE_PLATFORMS {
            let route = resolve_route(&device(platform, false)).unwrap();
            assert_eq!(route, TransportRoute::Direct);
        }
    }

    #[test]
    fn test_scrape_platform_with_proxy_routes_tunneled() {
        for platform in platform::SCRAPE_PLATFORMS {
            let route = resolve_route(&device(platform, true)).unwrap();
            assert_eq!(route, TransportRoute::Tunneled);
        }
    }

    #[test]
    fn test_rest_platform_routes_rest() {
        for platform in platform::REST_PLATFORMS {
            let route = resolve_route(&device(platform, false)).unwrap();
            assert_eq!(route, TransportRoute::Rest);
        }
    }

    #[test]
    fn test_unknown_platform_fails_fast() {
        let result = resolve_route(&device("cisco_nxos", false));
        match result {
            Err(QueryError::UnsupportedPlatform { device, platform }) => {
                assert_eq!(device, "San Francisco");
                assert_eq!(platform, "cisco_nxos");
            }
            other => panic!("expected unsupported platform, got {other:?}"),
        }
    }
}
