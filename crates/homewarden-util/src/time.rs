//! Time utilities for homewarden
//!
//! All engine timing (presence debounce, action cooldown) uses monotonic
//! time so wall-clock adjustments cannot flip machines offline or defeat
//! the cooldown gate.

use std::time::{Duration, Instant};

/// Represents a point in monotonic time.
/// This is immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Duration since `earlier`, saturating to zero if `earlier` is later.
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_instant_advances() {
        let t1 = MonotonicInstant::now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = MonotonicInstant::now();

        assert!(t2 > t1);
        assert!(t2.duration_since(t1) >= Duration::from_millis(10));
    }

    #[test]
    fn duration_since_saturates() {
        let t1 = MonotonicInstant::now();
        let t2 = t1 + Duration::from_secs(5);

        assert_eq!(t1.duration_since(t2), Duration::ZERO);
        assert_eq!(t2.duration_since(t1), Duration::from_secs(5));
    }

    #[test]
    fn simulated_time_arithmetic() {
        let start = MonotonicInstant::now();
        let later = start + Duration::from_secs(300);
        assert_eq!(later.duration_since(start), Duration::from_secs(300));
    }

}
