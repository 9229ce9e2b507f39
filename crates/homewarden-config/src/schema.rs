//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Local network settings
    pub network: RawNetworkConfig,

    /// Probe cadence and timeout
    #[serde(default)]
    pub ping: RawPingConfig,

    /// The server to be woken up / shut down
    pub server: RawMachine,

    /// Machines whose activity keeps the server running
    #[serde(default)]
    pub machines: Vec<RawMachine>,

    /// Sentinel file paths
    #[serde(default)]
    pub files: RawFilesConfig,
}

/// Network section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawNetworkConfig {
    /// Name of the interface to probe and send from (e.g. "eth0")
    pub interface: String,
}

/// Ping section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPingConfig {
    /// Seconds between probe sweeps
    #[serde(default = "default_ping_interval")]
    pub interval_seconds: u64,

    /// Seconds to wait for replies within one sweep (1..=255)
    #[serde(default = "default_ping_timeout")]
    pub timeout_seconds: u64,
}

fn default_ping_interval() -> u64 {
    30
}

fn default_ping_timeout() -> u64 {
    10
}

impl Default for RawPingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_ping_interval(),
            timeout_seconds: default_ping_timeout(),
        }
    }
}

/// One machine definition (the server or a watched machine)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMachine {
    /// Display name
    pub name: String,

    /// Hardware address in colon-hex form
    pub mac: String,

    /// IPv4 address
    pub ip: String,

    /// Seconds without a probe reply before the machine counts as offline
    pub timeout_seconds: u64,

    /// Login for remote shutdown (server only)
    pub username: Option<String>,

    /// Password for remote shutdown; empty means key/none authentication
    #[serde(default)]
    pub password: String,
}

/// Files section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFilesConfig {
    /// Sentinel whose existence forces the server to stay on
    pub always_on: Option<PathBuf>,
}
