//! Power decision policy

use homewarden_util::MonotonicInstant;
use std::time::Duration;

/// Minimum time between consecutive wake/shutdown actions
pub const ACTION_COOLDOWN: Duration = Duration::from_secs(120);

/// Action the daemon should execute against the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Wake,
    Shutdown,
}

/// Wake/shutdown decision policy with an anti-flap cooldown
///
/// The cooldown clock is armed at construction, so a freshly restarted
/// daemon waits out one window before its first action. The always-on
/// override bypasses the gate entirely, making every tick eligible.
#[derive(Debug)]
pub struct PowerPolicy {
    cooldown: Duration,
    last_action: MonotonicInstant,
}

impl PowerPolicy {
    pub fn new(now: MonotonicInstant) -> Self {
        Self {
            cooldown: ACTION_COOLDOWN,
            last_action: now,
        }
    }

    /// Evaluate the policy for one tick.
    ///
    /// The two conditions require opposite server states, so at most one
    /// action can come out of a single evaluation.
    pub fn evaluate(
        &self,
        always_on: bool,
        any_machine_online: bool,
        server_online: bool,
        now: MonotonicInstant,
    ) -> Option<PowerAction> {
        if !always_on && !self.cooldown_elapsed(now) {
            return None;
        }

        if (always_on || any_machine_online) && !server_online {
            Some(PowerAction::Wake)
        } else if !always_on && !any_machine_online && server_online {
            Some(PowerAction::Shutdown)
        } else {
            None
        }
    }

    /// Reset the cooldown clock after a successful action.
    ///
    /// Callers skip this on failure so the next eligible tick retries.
    pub fn record_action(&mut self, now: MonotonicInstant) {
        self.last_action = now;
    }

    fn cooldown_elapsed(&self, now: MonotonicInstant) -> bool {
        now.duration_since(self.last_action) >= self.cooldown
    }
}
