//! Typed settings converted from the raw schema
//!
//! Conversion assumes the raw config already passed validation; the parse
//! steps here cannot fail on validated input.

use crate::schema::{RawConfig, RawMachine};
use homewarden_util::MacAddr;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

/// Validated, typed configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub network: NetworkSettings,
    pub ping: PingSettings,
    pub server: MachineSpec,
    pub machines: Vec<MachineSpec>,
    /// Existence of this file forces the server to stay on
    pub always_on_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub interface: String,
}

#[derive(Debug, Clone)]
pub struct PingSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Shutdown login for the server record
#[derive(Debug, Clone)]
pub struct CredentialsSpec {
    pub username: String,
    /// Empty means "skip password authentication"
    pub password: String,
}

/// Identity of one monitored host or the server
#[derive(Debug, Clone)]
pub struct MachineSpec {
    pub name: String,
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
    /// Debounce window before a silent machine counts as offline
    pub timeout: Duration,
    pub credentials: Option<CredentialsSpec>,
}

impl Settings {
    /// Convert a validated raw config into typed settings
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            network: NetworkSettings {
                interface: raw.network.interface,
            },
            ping: PingSettings {
                interval: Duration::from_secs(raw.ping.interval_seconds),
                timeout: Duration::from_secs(raw.ping.timeout_seconds),
            },
            server: MachineSpec::from_raw(&raw.server),
            machines: raw.machines.iter().map(MachineSpec::from_raw).collect(),
            always_on_path: raw.files.always_on,
        }
    }
}

impl MachineSpec {
    fn from_raw(raw: &RawMachine) -> Self {
        Self {
            name: raw.name.clone(),
            mac: raw.mac.parse().expect("validated MAC"),
            ip: raw.ip.parse().expect("validated IPv4 address"),
            timeout: Duration::from_secs(raw.timeout_seconds),
            credentials: raw.username.as_ref().map(|username| CredentialsSpec {
                username: username.clone(),
                password: raw.password.clone(),
            }),
        }
    }
}
