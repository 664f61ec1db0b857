//! Two encoder odometry

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace};
use std::sync::Arc;

// Internal
use super::{integrate, OdomError, OdomParams, Odometer, Pose, PoseHandle};
use crate::model::{ChassisModel, EncoderReading};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Odometry from the left and right side encoders.
pub struct Odometry {
    model: Arc<dyn ChassisModel>,
    params: OdomParams,
    last_ticks: EncoderReading,
    pose: PoseHandle,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Odometry {
    /// Start odometry at the origin, from the model's current encoder values.
    pub fn new(model: Arc<dyn ChassisModel>, params: OdomParams) -> Result<Self, OdomError> {
        params.validate()?;

        let odom = Self::start(model, params);

        info!(
            "Two encoder odometry started at L {} R {}",
            odom.last_ticks.left, odom.last_ticks.right
        );

        Ok(odom)
    }

    /// Start from the current encoder values without validating `params`.
    pub(super) fn start(model: Arc<dyn ChassisModel>, params: OdomParams) -> Self {
        let last_ticks = model.get_sensor_vals();

        Self {
            model,
            params,
            last_ticks,
            pose: PoseHandle::default(),
        }
    }

    pub fn params(&self) -> &OdomParams {
        &self.params
    }

    /// The encoder values seen on the last step.
    pub fn last_ticks(&self) -> EncoderReading {
        self.last_ticks
    }

    /// Read the encoders and integrate the change since the last step.
    ///
    /// Forward motion and heading come from the side encoders, the lateral
    /// distance is given by `lateral` from the change in ticks.
    pub(super) fn step_with<F>(&mut self, lateral: F) -> Pose
    where
        F: FnOnce(&EncoderReading) -> f64,
    {
        let ticks = self.model.get_sensor_vals();
        let delta = ticks - self.last_ticks;

        // A reading missing the middle channel keeps the last middle value,
        // so the next full reading gets the whole change.
        self.last_ticks = EncoderReading {
            middle: ticks.middle.or(self.last_ticks.middle),
            ..ticks
        };

        let d_fwd = delta.mean_side() * self.params.scale;
        let d_lat = lateral(&delta);
        let d_theta = delta.side_diff() * self.params.turn_scale;

        let pose = integrate(&self.pose.get(), d_fwd, d_lat, d_theta);
        self.pose.set(pose);

        trace!(
            "Odometry: dL {} dR {} dM {:?} -> ({:.2}, {:.2}, {:.2} deg)",
            delta.left,
            delta.right,
            delta.middle,
            pose.x,
            pose.y,
            pose.theta_deg()
        );

        pose
    }
}

impl Odometer for Odometry {
    fn step(&mut self) -> Pose {
        self.step_with(|_| 0.0)
    }

    fn pose(&self) -> PoseHandle {
        self.pose.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{SimChassis, SimChassisParams};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn sim() -> Arc<SimChassis> {
        Arc::new(SimChassis::new(SimChassisParams {
            ticks_per_power: 1.0,
            middle_offset: None,
        }))
    }

    fn unit_params() -> OdomParams {
        OdomParams {
            scale: 1.0,
            turn_scale: 0.01,
            middle_scale: 1.0,
            period_ms: 10,
        }
    }

    #[test]
    fn test_straight_travel() {
        let sim = sim();
        let mut odom = Odometry::new(
            sim.clone(),
            OdomParams {
                scale: 0.5,
                ..unit_params()
            },
        )
        .unwrap();

        for _ in 0..10 {
            sim.drive_forward(20);
            odom.step();
        }

        let p = odom.pose().get();
        assert!((p.x - 100.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
        assert_eq!(p.theta, 0.0);
    }

    #[test]
    fn test_pure_rotation() {
        let sim = sim();
        let mut odom = Odometry::new(sim.clone(), unit_params()).unwrap();

        // Right forward, left back, so counter-clockwise
        for _ in 0..5 {
            sim.tank(-10, 10);
            odom.step();
        }

        let p = odom.pose().get();
        assert!(p.x.abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
        assert!((p.theta - 100.0 * 0.01).abs() < 1e-9);

        // And back the other way
        for _ in 0..5 {
            sim.turn_clockwise(10);
            odom.step();
        }
        assert!(odom.pose().get().theta.abs() < 1e-9);
    }

    #[test]
    fn test_quarter_circle_is_step_independent() {
        // Left 10 and right 20 ticks per step, turning pi/20 per step, a
        // radius of 15 / (pi / 20). Ten steps make a quarter circle.
        let params = OdomParams {
            turn_scale: PI / 200.0,
            ..unit_params()
        };
        let radius = 300.0 / PI;

        let sim = sim();
        let mut odom = Odometry::new(sim.clone(), params).unwrap();
        for _ in 0..10 {
            sim.tank(10, 20);
            odom.step();
        }

        let p = odom.pose().get();
        assert!((p.x - radius).abs() < 1e-9);
        assert!((p.y - radius).abs() < 1e-9);
        assert!((p.theta - FRAC_PI_2).abs() < 1e-9);

        // The same arc read in a single step ends in the same place
        let sim = self::sim();
        let mut odom = Odometry::new(sim.clone(), params).unwrap();
        sim.inject_ticks(100.0, 200.0, 0.0);
        let q = odom.step();
        assert!((q.x - p.x).abs() < 1e-9);
        assert!((q.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn test_full_circle_returns_to_origin() {
        // 400 steps of pi/200 turning make a full circle
        let params = OdomParams {
            turn_scale: PI / 2000.0,
            ..unit_params()
        };

        let sim = sim();
        let mut odom = Odometry::new(sim.clone(), params).unwrap();
        for _ in 0..400 {
            sim.tank(20, 30);
            odom.step();
        }

        let p = odom.pose().get();
        assert!(p.position().norm() < 1e-6);
        assert!(p.theta.abs() < 1e-6);
    }

    #[test]
    fn test_stale_reads_do_not_move() {
        let sim = sim();
        let mut odom = Odometry::new(sim.clone(), unit_params()).unwrap();

        sim.drive_vector(30, 5);
        let moved = odom.step();
        assert_ne!(moved, Pose::default());

        assert_eq!(odom.step(), moved);
        assert_eq!(odom.step(), moved);
    }

    #[test]
    fn test_starts_from_current_ticks() {
        let sim = sim();
        sim.drive_forward(100);

        let mut odom = Odometry::new(sim.clone(), unit_params()).unwrap();
        assert_eq!(odom.step(), Pose::default());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = OdomParams {
            period_ms: 0,
            ..unit_params()
        };
        assert!(matches!(
            Odometry::new(sim(), params),
            Err(OdomError::ZeroPeriod)
        ));
    }
}
