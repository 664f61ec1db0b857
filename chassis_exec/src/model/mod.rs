//! # Chassis model module
//!
//! The chassis model is the boundary between the control software and the
//! drivetrain. It exposes the current encoder readings and a set of raw
//! actuation primitives. Both the chassis controllers and odometry hold a
//! shared handle to the same model.
//!
//! # Concurrency
//!
//! Reading the sensors has no side effects and may be done from any number
//! of threads at once. Actuation commands change the state of the hardware
//! and must only be issued from one context at a time. This is up to the
//! caller, the model itself does not coordinate actuators.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use std::ops::Sub;
use std::sync::Arc;

// Internal
pub use sim::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The largest magnitude of power accepted by the actuation commands.
pub const MAX_POWER: i32 = 127;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A snapshot of the chassis encoders.
///
/// Values are accumulated signed ticks, zero when the model was constructed.
/// The middle channel is only present on models with a third encoder mounted
/// perpendicular to the side encoders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EncoderReading {
    /// Left side encoder ticks
    pub left: i32,

    /// Right side encoder ticks
    pub right: i32,

    /// Perpendicular (middle) encoder ticks, if fitted
    pub middle: Option<i32>,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// The sensing and actuation capability of a chassis.
///
/// Powers are in the range `[-MAX_POWER, MAX_POWER]`, implementations shall
/// saturate values outside of it.
pub trait ChassisModel: Send + Sync {
    /// Read the current encoder values.
    fn get_sensor_vals(&self) -> EncoderReading;

    /// Drive both sides forward at the same power.
    fn drive_forward(&self, power: i32);

    /// Drive with a forward component and a rotational component.
    fn drive_vector(&self, dist_power: i32, angle_power: i32);

    /// Turn on the spot, positive power turning clockwise.
    fn turn_clockwise(&self, power: i32);

    /// Stop all drive motors.
    fn stop(&self);

    /// Tank drive, each side driven independently.
    fn tank(&self, left_power: i32, right_power: i32);

    /// Arcade drive from a vertical (forward) and horizontal (turn) input.
    fn arcade(&self, vertical: i32, horizontal: i32);

    /// Drive only the left side.
    fn left(&self, power: i32);

    /// Drive only the right side.
    fn right(&self, power: i32);
}

/// Parameters from which a chassis model can be built.
pub trait ChassisModelParams {
    /// Build the model described by these parameters.
    fn make(&self) -> Arc<dyn ChassisModel>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EncoderReading {
    /// Create a reading from the two side encoders.
    pub fn new(left: i32, right: i32) -> Self {
        Self {
            left,
            right,
            middle: None,
        }
    }

    /// Create a reading from the two side encoders and the middle encoder.
    pub fn with_middle(left: i32, right: i32, middle: i32) -> Self {
        Self {
            left,
            right,
            middle: Some(middle),
        }
    }

    /// Number of channels in this reading.
    pub fn num_channels(&self) -> usize {
        if self.middle.is_some() {
            3
        } else {
            2
        }
    }

    /// Half the sum of the side channels. Nulls out any pure rotation.
    pub fn mean_side(&self) -> f64 {
        (self.left as f64 + self.right as f64) / 2.0
    }

    /// Right minus left. Nulls out any pure translation.
    pub fn side_diff(&self) -> f64 {
        self.right as f64 - self.left as f64
    }
}

impl Sub for EncoderReading {
    type Output = EncoderReading;

    /// Per-channel difference. The middle channel is only present if it is
    /// present in both readings.
    fn sub(self, rhs: Self) -> Self::Output {
        EncoderReading {
            left: self.left.wrapping_sub(rhs.left),
            right: self.right.wrapping_sub(rhs.right),
            middle: match (self.middle, rhs.middle) {
                (Some(a), Some(b)) => Some(a.wrapping_sub(b)),
                _ => None,
            },
        }
    }
}

/// Saturate a power value into the valid actuation range.
pub fn clamp_power(power: i32) -> i32 {
    power.clamp(-MAX_POWER, MAX_POWER)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_reading_sub() {
        let a = EncoderReading::with_middle(100, 80, -5);
        let b = EncoderReading::with_middle(40, 90, 5);

        assert_eq!(a - b, EncoderReading::with_middle(60, -10, -10));
        assert_eq!(
            EncoderReading::new(3, 4) - EncoderReading::with_middle(1, 1, 1),
            EncoderReading::new(2, 3)
        );
    }

    #[test]
    fn test_reading_mean_and_diff() {
        let r = EncoderReading::new(90, 110);

        assert_eq!(r.mean_side(), 100.0);
        assert_eq!(r.side_diff(), 20.0);
        assert_eq!(r.num_channels(), 2);
    }

    #[test]
    fn test_clamp_power() {
        assert_eq!(clamp_power(500), MAX_POWER);
        assert_eq!(clamp_power(-500), -MAX_POWER);
        assert_eq!(clamp_power(12), 12);
    }
}
