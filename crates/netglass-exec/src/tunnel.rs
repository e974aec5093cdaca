//! Ephemeral local forwarding through a jump host
//!
//! [`LocalForward`] binds a local ephemeral port and relays every accepted
//! connection through the proxy's SSH session to the target device.
//! [`TunneledExecutor`] stands a forward up, runs a direct session against
//! the local endpoint with the target device's credential, and tears the
//! forward down on every exit path. One deadline covers tunnel setup and
//! command execution combined.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use russh::{Disconnect, client};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use netglass_core::{Device, QueryError};

use crate::deadline::Deadline;
use crate::ssh::{self, DirectExecutor, SessionError, SshClientHandler};
use crate::traits::QueryTransport;

/// Handles one accepted local connection
#[async_trait]
trait ForwardTarget: Send + Sync {
    async fn relay(&self, inbound: TcpStream) -> io::Result<()>;
}

/// Relays a local connection through the proxy session to the device
struct DirectTcpIp {
    session: Arc<client::Handle<SshClientHandler>>,
    host: String,
    port: u16,
}

#[async_trait]
impl ForwardTarget for DirectTcpIp {
    async fn relay(&self, mut inbound: TcpStream) -> io::Result<()> {
        let channel = self
            .session
            .channel_open_direct_tcpip(&self.host, u32::from(self.port), "127.0.0.1", 0)
            .await
            .map_err(io::Error::other)?;
        let mut stream = channel.into_stream();
        tokio::io::copy_bidirectional(&mut inbound, &mut stream).await?;
        Ok(())
    }
}

/// An ephemeral local forward bound to one executor invocation
///
/// Exclusively owned by the invocation that created it; never shared,
/// handed off or cached across calls.
pub struct LocalForward {
    local_port: u16,
    accept_task: Option<JoinHandle<()>>,
    session: Option<Arc<client::Handle<SshClientHandler>>>,
}

impl LocalForward {
    /// Forward accepted connections through `session` to the target
    pub(crate) async fn start(
        session: client::Handle<SshClientHandler>,
        target_host: &str,
        target_port: u16,
    ) -> io::Result<Self> {
        let session = Arc::new(session);
        let target = Arc::new(DirectTcpIp {
            session: Arc::clone(&session),
            host: target_host.to_string(),
            port: target_port,
        });
        Self::bind(Some(session), target).await
    }

    async fn bind(
        session: Option<Arc<client::Handle<SshClientHandler>>>,
        target: Arc<dyn ForwardTarget>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let local_port = listener.local_addr()?.port();

        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((inbound, peer)) => {
                        debug!(%peer, "accepted tunnel connection");
                        let target = Arc::clone(&target);
                        tokio::spawn(async move {
                            if let Err(e) = target.relay(inbound).await {
                                debug!(error = %e, "tunnel relay ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        debug!(error = %e, "tunnel accept loop ended");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            local_port,
            accept_task: Some(accept_task),
            session,
        })
    }

    /// Local port the forward listens on
    #[must_use]
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Tear down the listener and the proxy session
    ///
    /// The local port is observably closed when this returns.
    pub async fn close(mut self) {
        if let Some(task) = self.accept_task.take() {
            task.abort();
            // wait for the task, and with it the listener, to be dropped
            let _ = task.await;
        }
        if let Some(session) = self.session.take() {
            if let Err(e) = session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
            {
                debug!(error = %e, "error during proxy disconnect");
            }
        }
    }
}

impl Drop for LocalForward {
    // backstop only; executors await close() on every exit path
    fn drop(&mut self) {
        if let Some(task) = &self.accept_task {
            task.abort();
        }
    }
}

/// Interactive executor reaching the device through a jump host
pub struct TunneledExecutor {
    device: Device,
    proxy: Device,
}

impl TunneledExecutor {
    /// Executor for `device` reached through `proxy`
    #[must_use]
    pub fn new(device: &Device, proxy: &Device) -> Self {
        Self {
            device: device.clone(),
            proxy: proxy.clone(),
        }
    }

    /// Authenticate to the proxy with its own credential and stand up the
    /// forward to the target device
    async fn open_forward(&self) -> Result<LocalForward, QueryError> {
        let session = ssh::open_authenticated(
            &self.proxy.address,
            self.proxy.port,
            &self.proxy.credential,
        )
        .await
        .map_err(|e| {
            self.setup_error(match e {
                SessionError::Connect(detail) | SessionError::Auth(detail) => detail,
            })
        })?;

        LocalForward::start(session, &self.device.address, self.device.port)
            .await
            .map_err(|e| self.setup_error(e.to_string()))
    }

    // setup failures, proxy auth included, are transport failures naming
    // the proxy; auth failures at the target device keep their own kind
    fn setup_error(&self, detail: String) -> QueryError {
        QueryError::Transport {
            device: self.device.display_name.clone(),
            proxy: Some(self.proxy.display_name.clone()),
            detail,
        }
    }
}

#[async_trait]
impl QueryTransport for TunneledExecutor {
    #[instrument(skip(self, commands), fields(device = %self.device.name, proxy = %self.proxy.name))]
    async fn run(&self, commands: &[String], deadline: Deadline) -> Result<String, QueryError> {
        debug!("connecting to proxy for tunnel setup");

        // expiry here drops the setup future, releasing any half-opened
        // proxy session with it
        let forward = match deadline.enforce(self.open_forward()).await {
            Ok(Ok(forward)) => forward,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                error!(proxy = %self.proxy.name, "deadline elapsed during tunnel setup");
                return Err(QueryError::Timeout {
                    device: self.device.display_name.clone(),
                    proxy: Some(self.proxy.display_name.clone()),
                    detail: "deadline exceeded during tunnel setup".to_string(),
                });
            }
        };

        debug!(port = forward.local_port(), "tunnel established");

        let direct = DirectExecutor::via_tunnel(
            &self.device,
            self.proxy.display_name.clone(),
            forward.local_port(),
        );
        let result = direct.run(commands, deadline).await;

        // torn down before any result, success or failure, surfaces
        forward.close().await;

        result
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    struct NoopTarget;

    #[async_trait]
    impl ForwardTarget for NoopTarget {
        async fn relay(&self, _inbound: TcpStream) -> io::Result<()> {
            Ok(())
        }
    }

    struct GreetingTarget;

    #[async_trait]
    impl ForwardTarget for GreetingTarget {
        async fn relay(&self, inbound: TcpStream) -> io::Result<()> {
            use tokio::io::AsyncWriteExt;
            let mut inbound = inbound;
            inbound.write_all(b"hello").await?;
            inbound.shutdown().await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_forward_accepts_on_ephemeral_port() {
        let forward = LocalForward::bind(None, Arc::new(GreetingTarget)).await.unwrap();
        let port = forward.local_port();
        assert_ne!(port, 0);

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"hello");

        forward.close().await;
    }

    #[tokio::test]
    async fn test_close_releases_the_local_port() {
        let forward = LocalForward::bind(None, Arc::new(NoopTarget)).await.unwrap();
        let port = forward.local_port();

        TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        forward.close().await;

        // no leaked listener: the port no longer accepts connections
        let result = TcpStream::connect(("127.0.0.1", port)).await;
        assert!(result.is_err());
    }
}
