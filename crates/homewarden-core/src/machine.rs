//! Machine records and presence hysteresis

use homewarden_config::MachineSpec;
use homewarden_util::{MacAddr, MonotonicInstant};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Login used to shut the server down over SSH
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    /// Empty means "skip password authentication"
    pub password: String,
}

/// One monitored host, or the server itself
///
/// Identity fields are fixed at startup; `online`/`last_online` are runtime
/// state owned by the engine. A machine starts Offline and flips Online on
/// the first attributed probe reply. Going the other way is debounced: the
/// machine stays Online until `timeout` has elapsed since the last reply,
/// which absorbs transient packet loss.
#[derive(Debug, Clone)]
pub struct Machine {
    name: String,
    mac: MacAddr,
    ip: Ipv4Addr,
    timeout: Duration,
    credentials: Option<Credentials>,

    online: bool,
    last_online: Option<MonotonicInstant>,
}

impl Machine {
    pub fn from_spec(spec: &MachineSpec) -> Self {
        Self {
            name: spec.name.clone(),
            mac: spec.mac,
            ip: spec.ip,
            timeout: spec.timeout,
            credentials: spec.credentials.as_ref().map(|c| Credentials {
                username: c.username.clone(),
                password: c.password.clone(),
            }),
            online: false,
            last_online: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn last_online(&self) -> Option<MonotonicInstant> {
        self.last_online
    }

    /// A probe reply was attributed to this machine.
    ///
    /// The timestamp refreshes on every reply, whether or not the state
    /// changes. Returns true when the machine just came online.
    pub fn record_reply(&mut self, now: MonotonicInstant) -> bool {
        let came_online = !self.online;
        self.online = true;
        self.last_online = Some(now);
        came_online
    }

    /// A sweep completed without a reply from this machine.
    ///
    /// An Online machine only flips once its debounce window has elapsed
    /// since the last reply; an Offline machine is left untouched.
    /// Returns true when the machine just went offline.
    pub fn record_miss(&mut self, now: MonotonicInstant) -> bool {
        if !self.online {
            return false;
        }

        let silent_for = self
            .last_online
            .map(|last| now.duration_since(last))
            .unwrap_or(Duration::MAX);

        if silent_for >= self.timeout {
            self.online = false;
            return true;
        }

        false
    }
}
