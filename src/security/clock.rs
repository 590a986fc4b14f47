//! Time source for window accounting.
//!
//! Readings are durations since an arbitrary fixed origin. Window
//! boundaries are aligned to that origin, so only differences matter.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Port for obtaining the current time.
pub trait Clock: Send + Sync + Debug {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Monotonic clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually driven clock for deterministic tests.
///
/// All clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    current: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new(start: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().expect("MockClock mutex poisoned");
        *current += by;
    }

    pub fn set(&self, at: Duration) {
        *self.current.lock().expect("MockClock mutex poisoned") = at;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Duration {
        *self.current.lock().expect("MockClock mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.now() > t1);
    }

    #[test]
    fn test_mock_clock_shared_between_clones() {
        let clock = MockClock::new(Duration::from_secs(1));
        let other = clock.clone();
        other.advance(Duration::from_millis(1500));
        assert_eq!(clock.now(), Duration::from_millis(2500));

        clock.set(Duration::ZERO);
        assert_eq!(other.now(), Duration::ZERO);
    }
}
