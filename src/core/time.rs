//! Time provider abstraction for testable time-dependent logic
//!
//! The scan throttle measures intervals with the monotonic clock while scan
//! entries are stamped with wall-clock time, so both are exposed here.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

/// Abstraction over system time for testable time-dependent logic
pub trait TimeProvider: Send + Sync {
    /// Get the current monotonic time (for measuring intervals)
    fn now(&self) -> Instant;

    /// Get the current system time (for timestamps)
    fn system_time(&self) -> SystemTime;
}

/// Production time provider using actual system time
#[derive(Debug, Default, Clone)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually driven clock for deterministic scan timing
///
/// Clones share the same underlying time, so a test can hand one clone to a
/// session and keep another to advance it.
#[derive(Debug, Clone)]
pub struct MockTimeProvider {
    origin: Instant,
    current_instant: Arc<Mutex<Instant>>,
    current_system_time: Arc<Mutex<SystemTime>>,
}

impl Default for MockTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTimeProvider {
    /// Create a new mock time provider starting at the current time
    pub fn new() -> Self {
        let base_instant = Instant::now();
        Self {
            origin: base_instant,
            current_instant: Arc::new(Mutex::new(base_instant)),
            current_system_time: Arc::new(Mutex::new(SystemTime::now())),
        }
    }

    /// Advance both monotonic and system time by the given duration
    pub fn advance_time(&self, duration: Duration) {
        if let Ok(mut instant) = self.current_instant.lock() {
            *instant += duration;
        }
        if let Ok(mut system_time) = self.current_system_time.lock() {
            *system_time += duration;
        }
    }

    /// Move the clock to `millis` after its creation time
    ///
    /// Moving backwards is ignored; the monotonic clock never rewinds.
    pub fn set_elapsed_millis(&self, millis: u64) {
        let target = self.origin + Duration::from_millis(millis);
        let current = self.now();
        if target > current {
            self.advance_time(target - current);
        }
    }

    /// Instant at `millis` after the clock's creation time
    pub fn at_millis(&self, millis: u64) -> Instant {
        self.origin + Duration::from_millis(millis)
    }
}

impl TimeProvider for MockTimeProvider {
    fn now(&self) -> Instant {
        self.current_instant
            .lock()
            .map(|instant| *instant)
            .unwrap_or(self.origin)
    }

    fn system_time(&self) -> SystemTime {
        self.current_system_time
            .lock()
            .map(|time| *time)
            .unwrap_or(SystemTime::UNIX_EPOCH)
    }
}
