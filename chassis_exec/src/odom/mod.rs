//! # Odometry module
//!
//! Dead reckoning of the chassis pose from its encoders. Each step reads the
//! encoders, takes the change since the previous step, and integrates it into
//! the pose assuming the chassis moved along a circular arc.
//!
//! Two variants are provided:
//!
//! - [`Odometry`] uses the two side encoders. Heading comes from their
//!   difference and distance from their mean, lateral motion is assumed to be
//!   zero.
//! - [`ThreeEncoderOdometry`] additionally reads an encoder mounted
//!   perpendicular to the side encoders, which measures the lateral motion the
//!   side encoders can't see. This happens for instance when the chassis
//!   doesn't turn about the point midway between the side wheels.
//!
//! The pose frame is fixed when odometry is constructed: the chassis is at
//! the origin facing along +X, and heading grows counter-clockwise.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod task;
mod three_enc;
mod two_enc;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

// Internal
pub use params::*;
pub use task::*;
pub use three_enc::*;
pub use two_enc::*;

use util::maths::wrap_rad_pi;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Heading changes smaller than this are integrated as straight lines.
///
/// Units: radians
const STRAIGHT_EPSILON_RAD: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The position and heading of the chassis in the odometry frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position along the initial heading
    pub x: f64,

    /// Position to the left of the initial heading
    pub y: f64,

    /// Heading, counter-clockwise from +X, in the range `(-pi, pi]`.
    ///
    /// Units: radians
    pub theta: f64,
}

/// A shared, read only view of a pose which is being updated by odometry.
///
/// Reads return a consistent snapshot of all three fields.
#[derive(Debug, Clone, Default)]
pub struct PoseHandle {
    inner: Arc<RwLock<Pose>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur in odometry.
#[derive(Debug, thiserror::Error)]
pub enum OdomError {
    #[error("The {0} scale must be positive and finite, found {1}")]
    InvalidScale(&'static str, f64),

    #[error("The odometry period must be non-zero")]
    ZeroPeriod,

    #[error("Three encoder odometry needs a model with a middle encoder")]
    NoMiddleEncoder,

    #[error("Could not spawn the odometry thread: {0}")]
    SpawnError(std::io::Error),

    #[error("The odometry thread panicked")]
    TaskPanicked,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// An odometry algorithm which can be stepped periodically.
pub trait Odometer {
    /// Read the encoders and integrate the motion since the last step,
    /// returning the new pose.
    fn step(&mut self) -> Pose;

    /// A handle through which the pose can be read from other threads.
    fn pose(&self) -> PoseHandle;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            x,
            y,
            theta: wrap_rad_pi(theta),
        }
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Heading in degrees, in the range `(-180, 180]`.
    pub fn theta_deg(&self) -> f64 {
        self.theta.to_degrees()
    }
}

impl PoseHandle {
    pub fn new(pose: Pose) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pose)),
        }
    }

    /// Get a snapshot of the current pose.
    pub fn get(&self) -> Pose {
        match self.inner.read() {
            Ok(p) => *p,
            Err(e) => *e.into_inner(),
        }
    }

    pub(crate) fn set(&self, pose: Pose) {
        match self.inner.write() {
            Ok(mut p) => *p = pose,
            Err(e) => *e.into_inner() = pose,
        }
    }
}

/// Move a pose by a displacement given in the chassis frame.
///
/// `d_fwd` is along the heading and `d_lat` is to the left of it, both
/// measured along the path travelled. The path is taken to be an arc turning
/// by `d_theta`, so the straight line (chord) displacement is shorter than the
/// path by `2 sin(d_theta / 2) / d_theta` and points along the mean heading of
/// the arc.
pub fn integrate(pose: &Pose, d_fwd: f64, d_lat: f64, d_theta: f64) -> Pose {
    let chord_factor = if d_theta.abs() < STRAIGHT_EPSILON_RAD {
        1.0
    } else {
        2.0 * (d_theta / 2.0).sin() / d_theta
    };

    let local = Vector2::new(d_fwd, d_lat) * chord_factor;
    let global = Rotation2::new(pose.theta + d_theta / 2.0) * local;

    Pose {
        x: pose.x + global[0],
        y: pose.y + global[1],
        theta: wrap_rad_pi(pose.theta + d_theta),
    }
}

/// Check a calibration scale is usable.
fn check_scale(name: &'static str, scale: f64) -> Result<(), OdomError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(OdomError::InvalidScale(name, scale))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_integrate_straight() {
        let p = integrate(&Pose::default(), 10.0, 0.0, 0.0);
        assert_eq!(p, Pose::new(10.0, 0.0, 0.0));

        let p = integrate(&Pose::new(1.0, 1.0, FRAC_PI_2), 2.0, 0.0, 0.0);
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_lateral() {
        // Lateral motion is to the left of the heading
        let p = integrate(&Pose::default(), 0.0, 5.0, 0.0);
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_quarter_arc_in_one_step() {
        // A quarter of a circle of radius 2 to the left, starting at the
        // origin facing +X, ends at (2, 2) facing +Y
        let radius = 2.0;
        let p = integrate(&Pose::default(), radius * FRAC_PI_2, 0.0, FRAC_PI_2);

        assert!((p.x - radius).abs() < 1e-12);
        assert!((p.y - radius).abs() < 1e-12);
        assert!((p.theta - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_wraps_heading() {
        let p = integrate(&Pose::new(0.0, 0.0, PI - 0.1), 0.0, 0.0, 0.2);
        assert!((p.theta - (-PI + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_pose_handle_shares_pose() {
        let h = PoseHandle::new(Pose::default());
        let reader = h.clone();

        h.set(Pose::new(1.0, 2.0, 0.5));
        assert_eq!(reader.get(), Pose::new(1.0, 2.0, 0.5));
        assert!((reader.get().theta_deg() - 0.5f64.to_degrees()).abs() < 1e-12);
    }
}
