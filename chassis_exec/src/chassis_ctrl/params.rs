//! Parameters structure for ChassisCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::ChassisCtrlError;
use crate::pid::PidParams;
use crate::settle::SettleParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the PID chassis controller.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChassisCtrlParams {
    // ---- TIMING ----

    /// Period of the motion control loops.
    ///
    /// Units: milliseconds
    pub period_ms: u64,

    /// Multiplier taking a regulator output in `[-1, 1]` to a chassis power.
    pub power_scale: f64,

    // ---- REGULATORS ----

    /// Gains for the distance controller, acting on the mean side ticks.
    pub distance_pid: PidParams,

    /// Gains for the angle controller, acting on the side differential
    /// (right - left ticks).
    ///
    /// The differential grows counter-clockwise, while `turn_clockwise` and
    /// the angular part of `drive_vector` turn clockwise for positive power
    /// on standard wiring. So these gains are negative for such a chassis.
    pub angle_pid: PidParams,

    // ---- SETTLING ----

    /// Settling of `drive_straight`, on the mean side ticks.
    pub straight_settle: SettleParams,

    /// Settling of `point_turn`, on the side differential.
    pub turn_settle: SettleParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ChassisCtrlParams {
    fn default() -> Self {
        Self {
            period_ms: 15,
            power_scale: 127.0,
            distance_pid: PidParams::new(0.01, 0.0, 0.0),
            angle_pid: PidParams::new(-0.02, 0.0, 0.0),
            straight_settle: SettleParams::straight(),
            turn_settle: SettleParams::turn(),
        }
    }
}

impl ChassisCtrlParams {
    /// Check the parameters describe a controller which can run.
    pub fn validate(&self) -> Result<(), ChassisCtrlError> {
        if self.period_ms == 0 {
            return Err(ChassisCtrlError::ZeroPeriod);
        }
        if !(self.power_scale.is_finite() && self.power_scale > 0.0) {
            return Err(ChassisCtrlError::InvalidPowerScale(self.power_scale));
        }
        if !self.straight_settle.is_valid() {
            return Err(ChassisCtrlError::InvalidSettleParams("drive_straight"));
        }
        if !self.turn_settle.is_valid() {
            return Err(ChassisCtrlError::InvalidSettleParams("point_turn"));
        }

        Ok(())
    }

    /// Control period in seconds.
    pub fn period_s(&self) -> f64 {
        self.period_ms as f64 / 1000.0
    }
}
