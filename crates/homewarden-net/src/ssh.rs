//! Remote shutdown over SSH

use crate::{NetError, NetResult};
use ssh2::Session;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;
use tracing::debug;

/// The command executed on the server; fixed, no substitution.
pub const SHUTDOWN_COMMAND: &str = "shutdown -h now";

const SSH_PORT: u16 = 22;

/// Executes the fixed shutdown command on a remote host
///
/// Stateless between calls; `timeout` bounds the TCP connect and, via the
/// session timeout, every subsequent blocking stage (handshake,
/// authentication, exec), so a hung server cannot stall the caller
/// indefinitely.
#[derive(Debug, Clone)]
pub struct ShutdownClient {
    timeout: Duration,
}

impl ShutdownClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Open a session to `ip` as `username` and request the shutdown.
    ///
    /// An empty password skips the authentication stage (key/none login).
    /// Any stage failure returns an error naming the stage; the session
    /// and channel are dropped on every path, so nothing leaks on early
    /// returns.
    pub fn shutdown(
        &self,
        name: &str,
        ip: Ipv4Addr,
        username: &str,
        password: &str,
    ) -> NetResult<()> {
        if username.is_empty() {
            return Err(NetError::MissingUsername);
        }

        let addr = SocketAddr::from((ip, SSH_PORT));
        debug!(machine = name, %addr, username, "Connecting over SSH");
        let tcp = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|source| NetError::SshConnect { addr, source })?;

        let mut session = Session::new().map_err(|source| NetError::Ssh {
            stage: "session",
            source,
        })?;
        session.set_timeout(self.timeout.as_millis().min(u128::from(u32::MAX)) as u32);
        session.set_tcp_stream(tcp);

        session.handshake().map_err(|source| NetError::Ssh {
            stage: "handshake",
            source,
        })?;

        if !password.is_empty() {
            debug!(machine = name, username, "Authenticating with password");
            session
                .userauth_password(username, password)
                .map_err(|source| NetError::Ssh {
                    stage: "authenticate",
                    source,
                })?;
        }

        let mut channel = session.channel_session().map_err(|source| NetError::Ssh {
            stage: "channel",
            source,
        })?;

        debug!(machine = name, command = SHUTDOWN_COMMAND, "Requesting shutdown");
        channel.exec(SHUTDOWN_COMMAND).map_err(|source| NetError::Ssh {
            stage: "exec",
            source,
        })?;

        // Best effort; the server may already be going down.
        let _ = channel.close();

        Ok(())
    }
}
