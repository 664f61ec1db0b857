//! General time utility functions
//!
//! Control loops never call the system clock directly. They are handed a
//! [`Clock`], which provides the current time and a drift-free periodic wake.
//! On the robot this is [`SystemClock`], in tests and simulations it is
//! [`SimClock`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Source of time and periodic suspension for control loops.
///
/// All times are in milliseconds since an arbitrary, clock-specific epoch.
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since the clock's epoch.
    fn millis(&self) -> u64;

    /// Advance `prev_wake_ms` by `period_ms` and suspend the caller until the
    /// clock reaches the new value.
    ///
    /// Because the anchor is advanced by exactly one period per call, a loop
    /// which does a variable amount of work per cycle still wakes on a fixed
    /// grid. If the loop overruns, the call returns immediately.
    fn delay_until(&self, prev_wake_ms: &mut u64, period_ms: u64);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Monotonic wall clock, suspending the calling thread with real sleeps.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

/// A simulated clock.
///
/// Time only moves when `delay_until` or `advance` is called, so loops driven
/// by this clock run as fast as the host allows and are fully deterministic.
#[derive(Debug, Default)]
pub struct SimClock {
    now_ms: AtomicU64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SystemClock {
    /// Create a new clock whose epoch is now.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn delay_until(&self, prev_wake_ms: &mut u64, period_ms: u64) {
        *prev_wake_ms += period_ms;

        let wake = self.epoch + Duration::from_millis(*prev_wake_ms);
        let now = Instant::now();

        if wake > now {
            thread::sleep(wake - now);
        }
    }
}

impl SimClock {
    /// Create a new simulated clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn millis(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn delay_until(&self, prev_wake_ms: &mut u64, period_ms: u64) {
        *prev_wake_ms += period_ms;
        self.now_ms.fetch_max(*prev_wake_ms, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}
