//! Simulated chassis
//!
//! A minimal plant used by the tests and the executable in place of real
//! hardware. Each actuation command moves the simulated encoders by an amount
//! proportional to the commanded power, so one command per control cycle
//! behaves like a velocity-controlled drivetrain with no inertia.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

// Internal
use super::{clamp_power, ChassisModel, ChassisModelParams, EncoderReading};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of most recent actuation calls kept by the simulated chassis.
pub const ACTUATION_LOG_LEN: usize = 4096;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated chassis.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SimChassisParams {
    /// Encoder ticks gained by a side per unit of commanded power per command.
    pub ticks_per_power: f64,

    /// If set the chassis has a middle encoder. The value is how many middle
    /// ticks are produced per tick of side differential (right - left), i.e.
    /// the offset of the middle wheel from the turn centre.
    #[serde(default)]
    pub middle_offset: Option<f64>,
}

/// A simulated differential chassis.
///
/// Uses standard differential wiring, so `turn_clockwise` drives the left
/// side forward and the right side backward, and a positive side differential
/// (right - left) is a counter-clockwise rotation.
#[derive(Debug)]
pub struct SimChassis {
    params: SimChassisParams,
    state: Mutex<SimState>,
}

/// A single actuation call recieved by the simulated chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Actuation {
    DriveForward(i32),
    DriveVector(i32, i32),
    TurnClockwise(i32),
    Stop,
    Tank(i32, i32),
    Arcade(i32, i32),
    Left(i32),
    Right(i32),
}

#[derive(Debug, Default)]
struct SimState {
    left_ticks: f64,
    right_ticks: f64,
    middle_ticks: f64,
    log: VecDeque<Actuation>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimChassisParams {
    fn default() -> Self {
        Self {
            ticks_per_power: 0.1,
            middle_offset: None,
        }
    }
}

impl ChassisModelParams for SimChassisParams {
    fn make(&self) -> Arc<dyn ChassisModel> {
        Arc::new(SimChassis::new(*self))
    }
}

impl SimChassis {
    /// Create a new simulated chassis with all encoders at zero.
    pub fn new(params: SimChassisParams) -> Self {
        Self {
            params,
            state: Mutex::new(SimState::default()),
        }
    }

    /// The last [`ACTUATION_LOG_LEN`] actuation calls recieved, oldest
    /// first.
    pub fn actuation_log(&self) -> Vec<Actuation> {
        self.lock().log.iter().copied().collect()
    }

    /// The most recent actuation call.
    pub fn last_actuation(&self) -> Option<Actuation> {
        self.lock().log.back().copied()
    }

    /// Directly add ticks to the encoders, for example to simulate being
    /// pushed.
    pub fn inject_ticks(&self, left: f64, right: f64, middle: f64) {
        let mut state = self.lock();
        state.left_ticks += left;
        state.right_ticks += right;
        state.middle_ticks += middle;
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // The state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and move the encoders by the side powers.
    fn apply(&self, cmd: Actuation, left_power: i32, right_power: i32) {
        let left = clamp_power(left_power) as f64 * self.params.ticks_per_power;
        let right = clamp_power(right_power) as f64 * self.params.ticks_per_power;

        let mut state = self.lock();
        state.left_ticks += left;
        state.right_ticks += right;
        if let Some(offset) = self.params.middle_offset {
            state.middle_ticks += offset * (right - left);
        }
        if state.log.len() == ACTUATION_LOG_LEN {
            state.log.pop_front();
        }
        state.log.push_back(cmd);

        trace!(
            "SimChassis {:?}: L {:.1} R {:.1} M {:.1}",
            cmd,
            state.left_ticks,
            state.right_ticks,
            state.middle_ticks
        );
    }
}

impl ChassisModel for SimChassis {
    fn get_sensor_vals(&self) -> EncoderReading {
        let state = self.lock();

        EncoderReading {
            left: state.left_ticks.round() as i32,
            right: state.right_ticks.round() as i32,
            middle: self
                .params
                .middle_offset
                .map(|_| state.middle_ticks.round() as i32),
        }
    }

    fn drive_forward(&self, power: i32) {
        self.apply(Actuation::DriveForward(power), power, power)
    }

    fn drive_vector(&self, dist_power: i32, angle_power: i32) {
        self.apply(
            Actuation::DriveVector(dist_power, angle_power),
            dist_power.saturating_add(angle_power),
            dist_power.saturating_sub(angle_power),
        )
    }

    fn turn_clockwise(&self, power: i32) {
        self.apply(Actuation::TurnClockwise(power), power, power.saturating_neg())
    }

    fn stop(&self) {
        self.apply(Actuation::Stop, 0, 0)
    }

    fn tank(&self, left_power: i32, right_power: i32) {
        self.apply(Actuation::Tank(left_power, right_power), left_power, right_power)
    }

    fn arcade(&self, vertical: i32, horizontal: i32) {
        self.apply(
            Actuation::Arcade(vertical, horizontal),
            vertical.saturating_add(horizontal),
            vertical.saturating_sub(horizontal),
        )
    }

    fn left(&self, power: i32) {
        self.apply(Actuation::Left(power), power, 0)
    }

    fn right(&self, power: i32) {
        self.apply(Actuation::Right(power), 0, power)
    }
}
