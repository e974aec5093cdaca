//! REST execution over the signed token envelope
//!
//! Each command is signed into a token, POSTed to the device's query
//! endpoint and the response token verified with the same secret. A non-200
//! status is recorded and checked in aggregate after all commands ran; a
//! response token that fails verification is a hard failure, never
//! silently-empty output.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error, instrument};
use url::Url;

use netglass_core::{Device, QueryError, Secret, TlsConfig};

use crate::deadline::Deadline;
use crate::result::join_responses;
use crate::token::{self, Envelope};
use crate::traits::QueryTransport;

/// HTTP executor for devices speaking the token envelope API
pub struct RestExecutor {
    device_name: String,
    address: String,
    port: u16,
    secret: Secret,
    tls: Option<TlsConfig>,
}

impl RestExecutor {
    /// Executor for a REST-capable device
    #[must_use]
    pub fn new(device: &Device) -> Self {
        Self {
            device_name: device.display_name.clone(),
            address: device.address.clone(),
            port: device.port,
            secret: device.credential.password.clone(),
            tls: device.tls.clone(),
        }
    }

    fn tls_enabled(&self) -> bool {
        self.tls.as_ref().is_some_and(|tls| tls.enabled)
    }

    /// Query endpoint for the device
    fn endpoint(&self) -> Result<Url, QueryError> {
        let scheme = if self.tls_enabled() { "https" } else { "http" };
        Url::parse(&format!(
            "{scheme}://{}:{}/query/",
            self.address, self.port
        ))
        .map_err(|e| self.rest_error(format!("invalid endpoint: {e}")))
    }

    /// Build the client for this invocation
    ///
    /// With TLS enabled the connection is pinned to the configured trust
    /// bundle instead of the system roots.
    fn build_client(&self, deadline: &Deadline) -> Result<reqwest::Client, QueryError> {
        let mut builder = reqwest::Client::builder().timeout(deadline.remaining());

        if let Some(tls) = &self.tls {
            if tls.enabled {
                if let Some(cert_path) = &tls.cert {
                    debug!(cert = %cert_path.display(), "pinning connection to trust bundle");
                    let pem = std::fs::read(cert_path).map_err(|e| {
                        self.rest_error(format!("failed to read trust bundle: {e}"))
                    })?;
                    let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                        self.rest_error(format!("invalid trust bundle: {e}"))
                    })?;
                    builder = builder
                        .add_root_certificate(cert)
                        .tls_built_in_root_certs(false);
                }
            }
        }

        builder
            .build()
            .map_err(|e| self.rest_error(format!("failed to build HTTP client: {e}")))
    }

    async fn post_commands(
        &self,
        client: &reqwest::Client,
        endpoint: &Url,
        commands: &[String],
        deadline: &Deadline,
    ) -> Result<String, QueryError> {
        let mut responses = Vec::with_capacity(commands.len());
        let mut failed_status: Option<StatusCode> = None;

        for command in commands {
            let encoded =
                token::encode_payload(command, self.secret.reveal(), deadline.remaining())
                    .map_err(|e| self.rest_error(format!("failed to sign query: {e}")))?;

            let response = client
                .post(endpoint.clone())
                .json(&Envelope { encoded })
                .send()
                .await
                .map_err(|e| self.rest_error(describe(&e)))?;

            let status = response.status();
            debug!(%status, "query endpoint responded");

            if status == StatusCode::OK {
                let body: Envelope = response
                    .json()
                    .await
                    .map_err(|e| self.rest_error(describe(&e)))?;
                let decoded = token::decode_payload(&body.encoded, self.secret.reveal())
                    .map_err(|e| self.rest_error(format!("response token rejected: {e}")))?;
                responses.push(decoded);
            } else {
                error!(%status, device = %self.device_name, "query endpoint returned failure status");
                failed_status = Some(status);
            }
        }

        if let Some(status) = failed_status {
            return Err(self.rest_error(format!("endpoint returned HTTP {status}")));
        }

        Ok(join_responses(&responses))
    }

    fn rest_error(&self, detail: String) -> QueryError {
        QueryError::Rest {
            device: self.device_name.clone(),
            detail,
        }
    }
}

/// Short classification plus the underlying error display
fn describe(err: &reqwest::Error) -> String {
    let class = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection error"
    } else if err.is_decode() {
        "response decode error"
    } else {
        "request error"
    };
    format!("{class}: {err}")
}

#[async_trait]
impl QueryTransport for RestExecutor {
    #[instrument(skip(self, commands), fields(device = %self.device_name, host = %self.address))]
    async fn run(&self, commands: &[String], deadline: Deadline) -> Result<String, QueryError> {
        let endpoint = self.endpoint()?;
        let client = self.build_client(&deadline)?;
        debug!(endpoint = %endpoint, "issuing REST query");

        match deadline
            .enforce(self.post_commands(&client, &endpoint, commands, &deadline))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(device = %self.device_name, "deadline elapsed during REST query");
                Err(QueryError::Timeout {
                    device: self.device_name.clone(),
                    proxy: None,
                    detail: "deadline exceeded during REST query".to_string(),
                })
            }
        }
    }
}
