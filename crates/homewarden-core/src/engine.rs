//! Per-tick orchestration of presence and power decisions

use crate::{Machine, PowerAction, PowerPolicy};
use homewarden_config::MachineSpec;
use homewarden_util::MonotonicInstant;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info};

/// Tick granularity of the control loop
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// The presence-and-power engine
///
/// Owns the server and machine records for the process lifetime and is the
/// only mutator of their runtime state. Performs no I/O: the daemon feeds
/// it sweep results and executes the actions it returns.
///
/// Per tick the steps run in a fixed order: always-on update, presence
/// update (on probing ticks), policy evaluation. The evaluation runs every
/// tick even between probe intervals, against the last sweep's presence
/// data.
pub struct Engine {
    server: Machine,
    machines: Vec<Machine>,
    policy: PowerPolicy,
    always_on: bool,
}

impl Engine {
    pub fn new(server: &MachineSpec, machines: &[MachineSpec], now: MonotonicInstant) -> Self {
        info!(
            server = %server.name,
            machine_count = machines.len(),
            "Engine initialized"
        );

        Self {
            server: Machine::from_spec(server),
            machines: machines.iter().map(Machine::from_spec).collect(),
            policy: PowerPolicy::new(now),
            always_on: false,
        }
    }

    pub fn server(&self) -> &Machine {
        &self.server
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn always_on(&self) -> bool {
        self.always_on
    }

    /// Everything a sweep should probe: the server plus every machine.
    pub fn probe_targets(&self) -> Vec<Ipv4Addr> {
        std::iter::once(self.server.ip())
            .chain(self.machines.iter().map(Machine::ip))
            .collect()
    }

    pub fn any_machine_online(&self) -> bool {
        self.machines.iter().any(Machine::is_online)
    }

    /// Update the always-on override, logging edges.
    pub fn set_always_on(&mut self, exists: bool) {
        if exists != self.always_on {
            if exists {
                info!("Always-on override enabled");
            } else {
                info!("Always-on override disabled");
            }
            self.always_on = exists;
        }
    }

    /// Feed one sweep's replies into the presence state machines.
    ///
    /// Every record whose IP is in `replies` gets its timestamp refreshed;
    /// the rest are debounced per their own timeout. Availability
    /// transitions are logged.
    pub fn observe_sweep(&mut self, replies: &HashSet<Ipv4Addr>, now: MonotonicInstant) {
        Self::observe_machine(&mut self.server, replies, now);
        for machine in &mut self.machines {
            Self::observe_machine(machine, replies, now);
        }
    }

    fn observe_machine(machine: &mut Machine, replies: &HashSet<Ipv4Addr>, now: MonotonicInstant) {
        if replies.contains(&machine.ip()) {
            if machine.record_reply(now) {
                info!(machine = %machine.name(), "Machine is now available");
            } else {
                debug!(machine = %machine.name(), "Machine still available");
            }
        } else if machine.record_miss(now) {
            info!(machine = %machine.name(), "Machine is no longer available");
        }
    }

    /// Evaluate the power policy against current presence.
    pub fn evaluate(&self, now: MonotonicInstant) -> Option<PowerAction> {
        self.policy.evaluate(
            self.always_on,
            self.any_machine_online(),
            self.server.is_online(),
            now,
        )
    }

    /// Reset the action cooldown after the daemon executed an action
    /// successfully.
    pub fn action_succeeded(&mut self, now: MonotonicInstant) {
        self.policy.record_action(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ACTION_COOLDOWN;
    use homewarden_config::MachineSpec;

    fn spec(name: &str, ip: &str, timeout_secs: u64) -> MachineSpec {
        MachineSpec {
            name: name.into(),
            mac: "aa:bb:cc:dd:ee:ff".parse().unwrap(),
            ip: ip.parse().unwrap(),
            timeout: Duration::from_secs(timeout_secs),
            credentials: None,
        }
    }

    fn test_engine(now: MonotonicInstant) -> Engine {
        Engine::new(
            &spec("server", "192.168.1.2", 300),
            &[
                spec("desktop", "192.168.1.10", 60),
                spec("laptop", "192.168.1.11", 60),
                spec("htpc", "192.168.1.12", 60),
            ],
            now,
        )
    }

    fn replies(ips: &[&str]) -> HashSet<Ipv4Addr> {
        ips.iter().map(|ip| ip.parse().unwrap()).collect()
    }

    #[test]
    fn sweep_marks_exactly_the_repliers_online() {
        let start = MonotonicInstant::now();
        let mut engine = test_engine(start);

        engine.observe_sweep(&replies(&["192.168.1.10", "192.168.1.12"]), start);

        let online: Vec<&str> = engine
            .machines()
            .iter()
            .filter(|m| m.is_online())
            .map(Machine::name)
            .collect();
        assert_eq!(online, ["desktop", "htpc"]);
        assert!(!engine.server().is_online());
    }

    #[test]
    fn reply_from_unswept_ip_is_ignored() {
        let start = MonotonicInstant::now();
        let mut engine = test_engine(start);

        engine.observe_sweep(&replies(&["10.0.0.99"]), start);

        assert!(!engine.any_machine_online());
        assert!(!engine.server().is_online());
    }

    #[test]
    fn probe_targets_cover_server_and_machines() {
        let engine = test_engine(MonotonicInstant::now());
        let targets = engine.probe_targets();

        assert_eq!(targets.len(), 4);
        assert_eq!(targets[0], "192.168.1.2".parse::<Ipv4Addr>().unwrap());
    }

    #[test]
    fn wake_fires_once_machine_appears() {
        let start = MonotonicInstant::now();
        let mut engine = test_engine(start);

        // Past the startup cooldown, nothing online: no action.
        let now = start + ACTION_COOLDOWN;
        engine.observe_sweep(&replies(&[]), now);
        assert_eq!(engine.evaluate(now), None);

        // A machine replies; the server is still down.
        engine.observe_sweep(&replies(&["192.168.1.10"]), now);
        assert_eq!(engine.evaluate(now), Some(PowerAction::Wake));
    }

    #[test]
    fn shutdown_fires_after_machines_debounce_out() {
        let start = MonotonicInstant::now();
        let mut engine = test_engine(start);

        let t0 = start + ACTION_COOLDOWN;
        engine.observe_sweep(&replies(&["192.168.1.2", "192.168.1.10"]), t0);
        assert_eq!(engine.evaluate(t0), None, "machine online, server up");

        // Machine goes silent but inside its 60s window: no action.
        let t1 = t0 + Duration::from_secs(30);
        engine.observe_sweep(&replies(&["192.168.1.2"]), t1);
        assert_eq!(engine.evaluate(t1), None);

        // Window elapsed: machine flips offline, shutdown is due.
        let t2 = t0 + Duration::from_secs(60);
        engine.observe_sweep(&replies(&["192.168.1.2"]), t2);
        assert_eq!(engine.evaluate(t2), Some(PowerAction::Shutdown));
    }

    #[test]
    fn cooldown_suppresses_followup_actions() {
        let start = MonotonicInstant::now();
        let mut engine = test_engine(start);

        let t0 = start + ACTION_COOLDOWN;
        engine.observe_sweep(&replies(&["192.168.1.10"]), t0);
        assert_eq!(engine.evaluate(t0), Some(PowerAction::Wake));
        engine.action_succeeded(t0);

        // Stale data keeps being evaluated every tick, but the gate holds
        // for the full cooldown window.
        for secs in [1, 60, 119] {
            assert_eq!(engine.evaluate(t0 + Duration::from_secs(secs)), None);
        }
        assert_eq!(
            engine.evaluate(t0 + ACTION_COOLDOWN),
            Some(PowerAction::Wake)
        );
    }

    #[test]
    fn always_on_keeps_server_up_without_machines() {
        let start = MonotonicInstant::now();
        let mut engine = test_engine(start);

        engine.set_always_on(true);

        // Override bypasses the armed startup cooldown.
        let now = start + Duration::from_secs(1);
        assert_eq!(engine.evaluate(now), Some(PowerAction::Wake));

        // Server up, no machines: override blocks shutdown.
        engine.observe_sweep(&replies(&["192.168.1.2"]), now);
        assert_eq!(engine.evaluate(now), None);

        // Override removed: shutdown becomes due once the gate opens.
        engine.set_always_on(false);
        let later = start + ACTION_COOLDOWN;
        assert_eq!(engine.evaluate(later), Some(PowerAction::Shutdown));
    }

    #[test]
    fn server_presence_uses_the_same_hysteresis() {
        let start = MonotonicInstant::now();
        let mut engine = test_engine(start);

        let t0 = start + ACTION_COOLDOWN;
        engine.observe_sweep(&replies(&["192.168.1.2", "192.168.1.10"]), t0);
        assert!(engine.server().is_online());

        // Server misses a sweep inside its 300s window: still online, so
        // no wake fires even though a machine is active.
        let t1 = t0 + Duration::from_secs(120);
        engine.observe_sweep(&replies(&["192.168.1.10"]), t1);
        assert!(engine.server().is_online());
        assert_eq!(engine.evaluate(t1), None);

        // Silent past the window: server offline, wake due.
        let t2 = t0 + Duration::from_secs(300);
        engine.observe_sweep(&replies(&["192.168.1.10"]), t2);
        assert!(!engine.server().is_online());
        assert_eq!(engine.evaluate(t2), Some(PowerAction::Wake));
    }
}
