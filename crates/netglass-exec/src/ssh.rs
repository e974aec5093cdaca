//! Direct SSH execution using the russh crate
//!
//! One executor invocation owns one authenticated session: it opens the
//! session, issues every command sequentially over it and disconnects on
//! every exit path. Command N's output is fully read before command N+1 is
//! sent; interactive device shells are not safely pipelineable.

use std::sync::Arc;

use async_trait::async_trait;
use russh::keys::ssh_key;
use russh::{ChannelMsg, Disconnect, client};
use tracing::{debug, error, instrument};

use netglass_core::{Credential, Device, QueryError};

use crate::deadline::Deadline;
use crate::result::join_responses;
use crate::traits::QueryTransport;

/// SSH client handler for russh
#[derive(Debug)]
pub(crate) struct SshClientHandler;

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Device host keys are registry-managed, not known_hosts-managed;
        // accept whatever the endpoint presents.
        Ok(true)
    }
}

/// Session setup failure, attributed by the caller
pub(crate) enum SessionError {
    /// TCP/SSH connection could not be established
    Connect(String),
    /// The endpoint rejected the credential
    Auth(String),
}

/// Open a session to `address:port` and authenticate with `credential`
pub(crate) async fn open_authenticated(
    address: &str,
    port: u16,
    credential: &Credential,
) -> Result<client::Handle<SshClientHandler>, SessionError> {
    let config = Arc::new(client::Config::default());

    let mut session = client::connect(config, (address, port), SshClientHandler)
        .await
        .map_err(|e| SessionError::Connect(e.to_string()))?;

    let auth_res = session
        .authenticate_password(
            credential.username.clone(),
            credential.password.reveal().to_string(),
        )
        .await
        .map_err(|e| SessionError::Auth(e.to_string()))?;

    if !auth_res.success() {
        return Err(SessionError::Auth(
            "password authentication rejected".to_string(),
        ));
    }

    Ok(session)
}

/// Interactive executor connecting straight to the device
///
/// Also used behind a tunnel, where it targets the tunnel's local endpoint
/// with the target device's credential and attributes failures to both the
/// device and the proxy.
pub struct DirectExecutor {
    host: String,
    port: u16,
    credential: Credential,
    device_name: String,
    proxy_name: Option<String>,
}

impl DirectExecutor {
    /// Executor for a directly reachable device
    #[must_use]
    pub fn new(device: &Device) -> Self {
        Self {
            host: device.address.clone(),
            port: device.port,
            credential: device.credential.clone(),
            device_name: device.display_name.clone(),
            proxy_name: None,
        }
    }

    /// Executor targeting the local end of an established tunnel
    pub(crate) fn via_tunnel(device: &Device, proxy_name: String, local_port: u16) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: local_port,
            credential: device.credential.clone(),
            device_name: device.display_name.clone(),
            proxy_name: Some(proxy_name),
        }
    }

    async fn open_session(&self) -> Result<client::Handle<SshClientHandler>, SessionError> {
        open_authenticated(&self.host, self.port, &self.credential).await
    }

    /// Issue every command in order over one session
    async fn run_commands(
        &self,
        session: &client::Handle<SshClientHandler>,
        commands: &[String],
    ) -> Result<Vec<String>, QueryError> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            let raw = self.exec_command(session, command).await?;
            debug!(command = %command, bytes = raw.len(), "command completed");
            responses.push(raw);
        }
        Ok(responses)
    }

    async fn exec_command(
        &self,
        session: &client::Handle<SshClientHandler>,
        command: &str,
    ) -> Result<String, QueryError> {
        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| self.transport_error(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| self.transport_error(e.to_string()))?;

        let mut output = Vec::new();
        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    output.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) if ext == 1 => {
                    debug!(bytes = data.len(), "discarding stderr from device shell");
                }
                Some(ChannelMsg::Eof) | None => break,
                _ => {}
            }
        }

        Ok(String::from_utf8_lossy(&output).to_string())
    }

    fn map_session_error(&self, err: SessionError) -> QueryError {
        match err {
            SessionError::Connect(detail) => self.transport_error(detail),
            SessionError::Auth(detail) => QueryError::Auth {
                device: self.device_name.clone(),
                proxy: self.proxy_name.clone(),
                detail,
            },
        }
    }

    fn transport_error(&self, detail: String) -> QueryError {
        QueryError::Transport {
            device: self.device_name.clone(),
            proxy: self.proxy_name.clone(),
            detail,
        }
    }

    fn timeout(&self, phase: &str) -> QueryError {
        QueryError::Timeout {
            device: self.device_name.clone(),
            proxy: self.proxy_name.clone(),
            detail: format!("deadline exceeded during {phase}"),
        }
    }
}

#[async_trait]
impl QueryTransport for DirectExecutor {
    #[instrument(skip(self, commands), fields(device = %self.device_name, host = %self.host))]
    async fn run(&self, commands: &[String], deadline: Deadline) -> Result<String, QueryError> {
        debug!(port = self.port, "opening interactive session");

        let session = match deadline.enforce(self.open_session()).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => return Err(self.map_session_error(e)),
            Err(_) => {
                error!(device = %self.device_name, "deadline elapsed during session setup");
                return Err(self.timeout("session setup"));
            }
        };

        let result = deadline.enforce(self.run_commands(&session, commands)).await;

        // closed before any error surfaces, on every exit path
        if let Err(e) = session
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            debug!(error = %e, "error during disconnect");
        }

        match result {
            Ok(Ok(responses)) => Ok(join_responses(&responses)),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                error!(device = %self.device_name, "deadline elapsed during command execution");
                Err(self.timeout("command execution"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use netglass_core::Secret;

    use super::*;

    fn unreachable_device() -> Device {
        Device {
            name: "test1".to_string(),
            display_name: "Test Device".to_string(),
            address: "127.0.0.1".to_string(),
            // nothing listens here
            port: 1,
            platform: "cisco_ios".to_string(),
            credential: Credential {
                username: "lg".to_string(),
                password: Secret::new("hunter2"),
            },
            proxy: None,
            tls: None,
        }
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_transport_error() {
        let executor = DirectExecutor::new(&unreachable_device());
        let deadline = Deadline::after(Duration::from_secs(5));
        let result = executor.run(&["show version".to_string()], deadline).await;

        match result {
            Err(QueryError::Transport { device, proxy, .. }) => {
                assert_eq!(device, "Test Device");
                assert_eq!(proxy, None);
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    #[ignore = "requires an SSH endpoint with password auth"]
    async fn test_auth_rejection_maps_to_auth_error() {
        // Exercised in environments with a throwaway sshd; the mapping
        // itself is covered by the coordinator integration tests.
    }
}
