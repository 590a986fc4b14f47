//! Weighted sliding-window rate limiter.
//!
//! Each key keeps the count of the current fixed window and the count of the
//! window before it. The rate estimate weights the previous count by the part
//! of it still covered by a window ending now:
//!
//! ```text
//! estimate = count + previous_count × (1 − elapsed_fraction)
//! ```
//!
//! # Concurrency
//! State lives in a `DashMap`. `observe` holds the shard write lock for the
//! whole read-modify-write, and the sweeper removes entries through
//! `retain`, which takes the same shard locks. The clock is read while the
//! lock is held, so a caller that stalls between reading the time and
//! locking can never observe a window older than the stored one. Provider
//! calls never run while a shard lock is held.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::observability::metrics;
use crate::security::clock::{Clock, SystemClock};
use crate::security::identity::Role;
use crate::security::policy::RulePolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimiterError {
    #[error("clock went backwards: window {observed:?} precedes stored window {stored:?}")]
    ClockWentBackwards { stored: Duration, observed: Duration },

    #[error("window length must be positive")]
    ZeroWindow,
}

/// Outcome of a single [`SlidingWindowLimiter::observe`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub allowed: bool,
    /// Requests still admissible in the current window after this one.
    pub remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WindowKey {
    role: Role,
    fingerprint: String,
}

#[derive(Debug, Clone)]
struct WindowState {
    window_start: Duration,
    count: u64,
    previous_count: u64,
    last_seen: Duration,
    window_length: Duration,
}

impl WindowState {
    fn new(window_start: Duration, window_length: Duration) -> Self {
        Self {
            window_start,
            count: 0,
            previous_count: 0,
            last_seen: window_start,
            window_length,
        }
    }

    /// Move the state into the window starting at `current_start`.
    fn roll(&mut self, current_start: Duration) -> Result<(), LimiterError> {
        if current_start == self.window_start {
            return Ok(());
        }
        if current_start < self.window_start {
            return Err(LimiterError::ClockWentBackwards {
                stored: self.window_start,
                observed: current_start,
            });
        }

        self.previous_count = if current_start - self.window_start == self.window_length {
            self.count
        } else {
            0
        };
        self.count = 0;
        self.window_start = current_start;
        Ok(())
    }

    fn is_idle(&self, now: Duration) -> bool {
        now.saturating_sub(self.last_seen) >= self.window_length * 2
    }
}

/// Start of the fixed window containing `now`.
fn window_start(now: Duration, window: Duration) -> Duration {
    let offset = now.as_nanos() % window.as_nanos();
    now - Duration::from_nanos(offset as u64)
}

/// Process-wide sliding-window counter store.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    windows: DashMap<WindowKey, WindowState>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }

    /// Count one request for `fingerprint` against `policy`.
    pub fn observe(&self, fingerprint: &str, policy: &RulePolicy) -> Result<Observation, LimiterError> {
        let window = policy.window_length;
        if window.is_zero() {
            return Err(LimiterError::ZeroWindow);
        }

        let key = WindowKey {
            role: policy.role,
            fingerprint: fingerprint.to_string(),
        };

        let mut entry = self
            .windows
            .entry(key)
            .or_insert_with(|| WindowState::new(window_start(self.clock.now(), window), window));

        // Read the clock under the shard lock so holders see increasing time.
        let now = self.clock.now();
        let current_start = window_start(now, window);
        let state = entry.value_mut();

        state.roll(current_start)?;
        state.last_seen = now;

        let elapsed_fraction = (now - current_start).as_secs_f64() / window.as_secs_f64();
        let estimate = state.count as f64 + state.previous_count as f64 * (1.0 - elapsed_fraction);
        let max = policy.max_requests as f64;

        if estimate >= max {
            return Ok(Observation {
                allowed: false,
                remaining: 0,
            });
        }

        state.count += 1;
        let remaining = (max - estimate - 1.0).max(0.0).floor() as u64;
        Ok(Observation {
            allowed: true,
            remaining,
        })
    }

    /// Remove entries idle for at least two windows. Returns how many went.
    pub fn sweep_idle(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows.retain(|_, state| !state.is_idle(now));
        let remaining = self.windows.len();
        let evicted = before.saturating_sub(remaining);

        metrics::record_window_entries(remaining);
        if evicted > 0 {
            metrics::record_window_evictions(evicted);
        }
        evicted
    }

    /// Periodically sweep idle entries until shutdown is signalled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        every: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            tracing::info!(interval_secs = every.as_secs(), "Window sweeper starting");
            let mut ticker = time::interval(every);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = limiter.sweep_idle();
                        if evicted > 0 {
                            tracing::debug!(evicted, remaining = limiter.len(), "Swept idle windows");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Window sweeper received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        })
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    #[doc(hidden)]
    pub fn current_count(&self, role: Role, fingerprint: &str) -> Option<u64> {
        let key = WindowKey {
            role,
            fingerprint: fingerprint.to_string(),
        };
        self.windows.get(&key).map(|state| state.count)
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }
}
