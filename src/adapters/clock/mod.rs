//! Clock adapters.
//!
//! `SystemClock` for production, `ManualClock` for deterministic tests of
//! refill math, TTL expiry, and breaker windows.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// System clock implementation using the real UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually driven clock for tests.
///
/// Clones share the same underlying time value, so advancing time in one
/// clone affects all clones.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current_time: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Create a manual clock starting at a specific moment.
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self
            .current_time
            .lock()
            .expect("ManualClock mutex poisoned - a test thread panicked while holding the lock");
        *time = time.plus_duration(duration);
    }

    /// Set the clock to a specific moment.
    pub fn set(&self, to: Timestamp) {
        let mut time = self
            .current_time
            .lock()
            .expect("ManualClock mutex poisoned - a test thread panicked while holding the lock");
        *time = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self
            .current_time
            .lock()
            .expect("ManualClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = clock.now();

        assert!(t2.is_after(&t1));
    }

    #[test]
    fn manual_clock_advances_explicitly() {
        let start = Timestamp::from_unix_secs(1_700_000_000);
        let clock = ManualClock::starting_at(start);

        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(10));
        assert_eq!(clock.now(), start.plus_secs(10));

        let later = start.plus_secs(100);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let start = Timestamp::from_unix_secs(1_700_000_000);
        let clock = ManualClock::starting_at(start);
        let clone = clock.clone();

        clone.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), start.plus_secs(5));
    }
}
