//! # Settling detection
//!
//! Decides when a closed-loop motion has finished. A motion is settled once a
//! qualifying condition has held for a whole confirmation window. A sample
//! qualifies if it is within the arrival threshold of the target, or if it
//! moved less than the stagnation threshold since the previous sample.
//!
//! The stagnation branch makes the motion end when the robot stalls short of
//! the target. The window stops a single noisy sample from ending it early.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A timer holding one "hard mark" timestamp.
///
/// Placing a mark while one is already placed keeps the first one, so the
/// elapsed time is always measured from the first sample of an unbroken run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SettleTimer {
    hard_mark_ms: Option<u64>,
}

/// Thresholds and window for settling detection.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SettleParams {
    /// Distance from the target within which the value has arrived.
    pub arrival_threshold: f64,

    /// Change between samples below which the value is stagnant.
    pub stagnation_threshold: f64,

    /// Time a qualifying condition must hold before the motion is settled.
    ///
    /// Units: milliseconds
    pub settle_window_ms: u64,
}

/// Arrival-or-stagnation settling detector.
#[derive(Debug, Clone, Serialize)]
pub struct SettleDetector {
    params: SettleParams,
    timer: SettleTimer,
    last_value: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SettleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the hard mark at `now_ms`, unless one is already placed.
    pub fn place_hard_mark(&mut self, now_ms: u64) {
        if self.hard_mark_ms.is_none() {
            self.hard_mark_ms = Some(now_ms);
        }
    }

    pub fn clear_hard_mark(&mut self) {
        self.hard_mark_ms = None;
    }

    pub fn hard_mark(&self) -> Option<u64> {
        self.hard_mark_ms
    }

    /// Time since the hard mark, or `None` if no mark is placed.
    pub fn dt_from_hard_mark(&self, now_ms: u64) -> Option<u64> {
        self.hard_mark_ms.map(|m| now_ms.saturating_sub(m))
    }
}

impl SettleParams {
    /// Reference settling for straight driving, in encoder ticks.
    pub fn straight() -> Self {
        Self {
            arrival_threshold: 15.0,
            stagnation_threshold: 2.0,
            settle_window_ms: 250,
        }
    }

    /// Reference settling for point turns, in encoder ticks of
    /// differential.
    pub fn turn() -> Self {
        Self {
            arrival_threshold: 10.0,
            stagnation_threshold: 2.0,
            settle_window_ms: 250,
        }
    }

    /// Check that none of the thresholds are negative or NaN.
    pub fn is_valid(&self) -> bool {
        self.arrival_threshold >= 0.0 && self.stagnation_threshold >= 0.0
    }
}

impl SettleDetector {
    pub fn new(params: SettleParams) -> Self {
        Self {
            params,
            timer: SettleTimer::new(),
            last_value: 0.0,
        }
    }

    /// Prepare for a new motion which starts at zero.
    pub fn reset(&mut self) {
        self.timer.clear_hard_mark();
        self.last_value = 0.0;
    }

    /// Feed a new sample, returning `true` once the motion has settled.
    pub fn update(&mut self, target: f64, value: f64, now_ms: u64) -> bool {
        let arrived = (target - value).abs() <= self.params.arrival_threshold;
        let stagnant = (value - self.last_value).abs() <= self.params.stagnation_threshold;

        if arrived || stagnant {
            self.timer.place_hard_mark(now_ms);
        } else {
            self.timer.clear_hard_mark();
        }

        self.last_value = value;

        match self.timer.dt_from_hard_mark(now_ms) {
            Some(dt) => dt >= self.params.settle_window_ms,
            None => false,
        }
    }

    /// Feed a new sample measured in encoder ticks, comparing whole ticks
    /// only.
    ///
    /// The value is truncated towards zero before both checks, so a step of
    /// 2.5 ticks from 10.0 to 12.5 counts as a step of 2.
    pub fn update_whole_ticks(&mut self, target: i32, value: f64, now_ms: u64) -> bool {
        self.update(target as f64, value.trunc(), now_ms)
    }

    /// Whether the last sample qualified.
    pub fn is_marked(&self) -> bool {
        self.timer.hard_mark().is_some()
    }

    pub fn timer(&self) -> &SettleTimer {
        &self.timer
    }

    pub fn params(&self) -> &SettleParams {
        &self.params
    }
}
