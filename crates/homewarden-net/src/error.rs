//! Error types for the network primitives

use std::net::SocketAddr;
use thiserror::Error;

/// Errors from interface resolution and the three network operations
#[derive(Debug, Error)]
pub enum NetError {
    #[error("network interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("network interface '{0}' has no IPv4 address")]
    MissingIpv4(String),

    #[error("network interface '{0}' has no hardware address")]
    MissingMac(String),

    #[error("missing username for remote shutdown")]
    MissingUsername,

    #[error("wake frame was not transmitted")]
    NothingSent,

    #[error("ssh connect to {addr} failed: {source}")]
    SshConnect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("ssh {stage} failed: {source}")]
    Ssh {
        stage: &'static str,
        #[source]
        source: ssh2::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type NetResult<T> = Result<T, NetError>;
