//! Scan Throttle
//!
//! A decoder keeps emitting the same code for as long as it stays in view.
//! The throttle lets one attempt through per interval and drops the rest.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Minimum interval between accepted scans
pub const DEFAULT_SCAN_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Default)]
struct Gate {
    last_accepted: Option<Instant>,
    previous: Option<Instant>,
}

#[derive(Debug)]
pub struct ScanThrottle {
    delay: Duration,
    gate: Mutex<Gate>,
}

impl Default for ScanThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_DELAY)
    }
}

impl ScanThrottle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            gate: Mutex::new(Gate::default()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn lock(&self) -> MutexGuard<'_, Gate> {
        // Poisoning cannot leave two instants half-written
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check-and-set under one lock
    ///
    /// Returns `false` without touching state while `now` is within the delay
    /// of the last accepted attempt. The first attempt always passes.
    pub fn should_accept(&self, now: Instant) -> bool {
        let mut gate = self.lock();
        if let Some(last) = gate.last_accepted {
            if now.saturating_duration_since(last) < self.delay {
                return false;
            }
        }
        gate.previous = gate.last_accepted.replace(now);
        true
    }

    /// Give back the slot taken at `accepted_at`
    ///
    /// Only the most recent acceptance can be released; anything accepted
    /// since then keeps the gate as it is.
    pub fn release(&self, accepted_at: Instant) {
        let mut gate = self.lock();
        if gate.last_accepted == Some(accepted_at) {
            gate.last_accepted = gate.previous.take();
        }
    }

    /// Reopen the gate
    pub fn reset(&self) {
        *self.lock() = Gate::default();
    }
}
