//! # Chassis control module
//!
//! Converts high level motion goals ("drive forward N ticks", "turn D
//! degrees") into a stream of actuation commands on a [`ChassisModel`].
//!
//! All controllers implement [`ChassisController`]. The trait provides direct
//! pass-through actuation through a shared [`ChassisCore`], and leaves the two
//! closed-loop motions to each controller:
//!
//! - [`ChassisControllerPid`] regulates distance and angle with two PID
//!   controllers.
//! - [`ChassisControllerMp`] hands the motion to a motion profile follower.
//!
//! Motion commands block their caller until the motion has settled, and the
//! chassis is always stopped when they return.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod mp_ctrl;
mod params;
mod pid_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;

// Internal
pub use mp_ctrl::*;
pub use params::*;
pub use pid_ctrl::*;

use crate::model::{ChassisModel, EncoderReading};
use crate::pid::PidError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Holds the chassis model and implements the pass-through actuation shared
/// by every controller.
#[derive(Clone)]
pub struct ChassisCore {
    model: Arc<dyn ChassisModel>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while building a chassis controller.
#[derive(Debug, thiserror::Error)]
pub enum ChassisCtrlError {
    #[error("The control period must be non-zero")]
    ZeroPeriod,

    #[error("The power scale must be positive and finite, found {0}")]
    InvalidPowerScale(f64),

    #[error("Invalid settle parameters for {0}")]
    InvalidSettleParams(&'static str),

    #[error("Invalid {0} controller: {1}")]
    InvalidPid(&'static str, PidError),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A chassis which can be driven directly or commanded to perform closed
/// loop motions.
///
/// Only one motion may be in progress on a chassis at once. The motion
/// commands take `&mut self`, so overlapping commands through one controller
/// can't compile. Callers sharing a model between several controllers or
/// threads must coordinate actuation themselves.
pub trait ChassisController {
    /// The shared core holding the chassis model.
    fn core(&self) -> &ChassisCore;

    /// Drive straight for `target` encoder ticks (mean of both sides).
    ///
    /// Blocks until the motion has settled, and stops the chassis before
    /// returning.
    fn drive_straight(&mut self, target: i32);

    /// Turn on the spot by `degrees`, normalised into `(-180, 180]`.
    ///
    /// Positive degrees are counter-clockwise, the direction in which the
    /// side differential (right - left) and odometry heading grow. On
    /// standard wiring this needs negative angle gains, see
    /// [`ChassisCtrlParams::angle_pid`].
    ///
    /// Blocks until the motion has settled, and stops the chassis before
    /// returning. A non-finite `degrees` only stops the chassis.
    fn point_turn(&mut self, degrees: f64);

    fn drive_forward(&self, power: i32) {
        self.core().drive_forward(power)
    }

    fn drive_vector(&self, dist_power: i32, angle_power: i32) {
        self.core().drive_vector(dist_power, angle_power)
    }

    fn turn_clockwise(&self, power: i32) {
        self.core().turn_clockwise(power)
    }

    fn stop(&self) {
        self.core().stop()
    }

    fn tank(&self, left_power: i32, right_power: i32) {
        self.core().tank(left_power, right_power)
    }

    fn arcade(&self, vertical: i32, horizontal: i32) {
        self.core().arcade(vertical, horizontal)
    }

    fn left(&self, power: i32) {
        self.core().left(power)
    }

    fn right(&self, power: i32) {
        self.core().right(power)
    }

    /// Current encoder values of the chassis.
    fn get_encoder_vals(&self) -> EncoderReading {
        self.core().get_encoder_vals()
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisCore {
    pub fn new(model: Arc<dyn ChassisModel>) -> Self {
        Self { model }
    }

    /// The underlying model, for example to share with odometry.
    pub fn model(&self) -> &Arc<dyn ChassisModel> {
        &self.model
    }

    pub fn drive_forward(&self, power: i32) {
        self.model.drive_forward(power)
    }

    pub fn drive_vector(&self, dist_power: i32, angle_power: i32) {
        self.model.drive_vector(dist_power, angle_power)
    }

    pub fn turn_clockwise(&self, power: i32) {
        self.model.turn_clockwise(power)
    }

    pub fn stop(&self) {
        self.model.stop()
    }

    pub fn tank(&self, left_power: i32, right_power: i32) {
        self.model.tank(left_power, right_power)
    }

    pub fn arcade(&self, vertical: i32, horizontal: i32) {
        self.model.arcade(vertical, horizontal)
    }

    pub fn left(&self, power: i32) {
        self.model.left(power)
    }

    pub fn right(&self, power: i32) {
        self.model.right(power)
    }

    pub fn get_encoder_vals(&self) -> EncoderReading {
        self.model.get_sensor_vals()
    }
}
