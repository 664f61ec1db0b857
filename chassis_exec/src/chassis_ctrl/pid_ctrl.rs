//! PID chassis controller
//!
//! Drives straight and point turns by closing the loop on the encoder
//! readings taken relative to the start of each motion. The mean of the side
//! encoders gives the distance travelled and their difference gives the
//! rotation, as one cancels the other out.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::sync::Arc;

// Internal
use super::{ChassisController, ChassisCore, ChassisCtrlError, ChassisCtrlParams};
use crate::model::{ChassisModel, ChassisModelParams};
use crate::pid::PidController;
use crate::settle::SettleDetector;
use util::maths::wrap_deg_180;
use util::time::Clock;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Chassis controller using a distance and an angle PID controller.
pub struct ChassisControllerPid {
    core: ChassisCore,
    clock: Arc<dyn Clock>,
    params: ChassisCtrlParams,

    distance_pid: PidController,
    angle_pid: PidController,

    straight_settle: SettleDetector,
    turn_settle: SettleDetector,

    report: Option<MotionReport>,
}

/// Summary of the last motion performed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionReport {
    pub kind: MotionKind,

    /// The target of the motion, after normalisation for turns.
    pub target: f64,

    /// The regulated value on the final cycle (ticks or differential ticks).
    pub final_value: f64,

    /// Number of control cycles run.
    pub cycles: u64,

    /// Time from the start of the motion to it being settled.
    ///
    /// Units: milliseconds
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotionKind {
    DriveStraight,
    PointTurn,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisControllerPid {
    /// Create a new controller on an existing model, building the regulators
    /// from the parameters.
    pub fn new(
        model: Arc<dyn ChassisModel>,
        clock: Arc<dyn Clock>,
        params: ChassisCtrlParams,
    ) -> Result<Self, ChassisCtrlError> {
        params.validate()?;

        let distance_pid = PidController::new(params.distance_pid, params.period_s())
            .map_err(|e| ChassisCtrlError::InvalidPid("distance", e))?;
        let angle_pid = PidController::new(params.angle_pid, params.period_s())
            .map_err(|e| ChassisCtrlError::InvalidPid("angle", e))?;

        Self::with_controllers(model, clock, params, distance_pid, angle_pid)
    }

    /// Create a new controller, building the model from its parameters.
    pub fn from_params<M>(
        model_params: &M,
        clock: Arc<dyn Clock>,
        params: ChassisCtrlParams,
    ) -> Result<Self, ChassisCtrlError>
    where
        M: ChassisModelParams + ?Sized,
    {
        Self::new(model_params.make(), clock, params)
    }

    /// Create a new controller from already built regulators.
    ///
    /// The gains in `params` are ignored, the regulators are used as given.
    pub fn with_controllers(
        model: Arc<dyn ChassisModel>,
        clock: Arc<dyn Clock>,
        params: ChassisCtrlParams,
        distance_pid: PidController,
        angle_pid: PidController,
    ) -> Result<Self, ChassisCtrlError> {
        params.validate()?;

        info!(
            "ChassisControllerPid created, period {} ms, power scale {}",
            params.period_ms, params.power_scale
        );

        Ok(Self {
            core: ChassisCore::new(model),
            clock,
            params,
            distance_pid,
            angle_pid,
            straight_settle: SettleDetector::new(params.straight_settle),
            turn_settle: SettleDetector::new(params.turn_settle),
            report: None,
        })
    }

    pub fn params(&self) -> &ChassisCtrlParams {
        &self.params
    }

    /// Report on the last completed motion, if any.
    pub fn last_report(&self) -> Option<MotionReport> {
        self.report
    }

    /// Convert a regulator output into a chassis power.
    fn to_power(&self, output: f64) -> i32 {
        (output * self.params.power_scale) as i32
    }
}

impl ChassisController for ChassisControllerPid {
    fn core(&self) -> &ChassisCore {
        &self.core
    }

    fn drive_straight(&mut self, target_ticks: i32) {
        let start_vals = self.core.get_encoder_vals();
        let target = target_ticks as f64;

        self.distance_pid.reset();
        self.angle_pid.reset();
        self.distance_pid.set_target(target);
        self.angle_pid.set_target(0.0);
        self.straight_settle.reset();

        debug!("drive_straight: target {} ticks from {:?}", target, start_vals);

        let start_ms = self.clock.millis();
        let mut prev_wake_ms = start_ms;
        let mut cycles = 0u64;

        let distance = loop {
            let delta = self.core.get_encoder_vals() - start_vals;
            let distance = delta.mean_side();
            let angle = delta.side_diff();

            let dist_out = self.distance_pid.step(distance);
            let angle_out = self.angle_pid.step(angle);
            self.core
                .drive_vector(self.to_power(dist_out), self.to_power(angle_out));

            trace!(
                "drive_straight: dist {:.1} angle {:.1} out ({:.3}, {:.3})",
                distance,
                angle,
                dist_out,
                angle_out
            );

            cycles += 1;

            // Distance settles on whole ticks
            if self
                .straight_settle
                .update_whole_ticks(target_ticks, distance, self.clock.millis())
            {
                break distance;
            }

            self.clock.delay_until(&mut prev_wake_ms, self.params.period_ms);
        };

        self.core.stop();

        let report = MotionReport {
            kind: MotionKind::DriveStraight,
            target,
            final_value: distance,
            cycles,
            elapsed_ms: self.clock.millis().saturating_sub(start_ms),
        };
        debug!("drive_straight: settled {:?}", report);
        self.report = Some(report);
    }

    fn point_turn(&mut self, degrees: f64) {
        if !degrees.is_finite() {
            warn!("point_turn: ignoring non-finite target {}", degrees);
            self.core.stop();
            self.report = None;
            return;
        }

        let start_vals = self.core.get_encoder_vals();
        let target = wrap_deg_180(degrees);

        self.angle_pid.reset();
        self.angle_pid.set_target(target);
        self.turn_settle.reset();

        debug!(
            "point_turn: target {:.1} (requested {:.1}) from {:?}",
            target, degrees, start_vals
        );

        let start_ms = self.clock.millis();
        let mut prev_wake_ms = start_ms;
        let mut cycles = 0u64;

        let angle = loop {
            let angle = (self.core.get_encoder_vals() - start_vals).side_diff();

            let angle_out = self.angle_pid.step(angle);
            self.core.turn_clockwise(self.to_power(angle_out));

            trace!("point_turn: angle {:.1} out {:.3}", angle, angle_out);

            cycles += 1;

            if self.turn_settle.update(target, angle, self.clock.millis()) {
                break angle;
            }

            self.clock.delay_until(&mut prev_wake_ms, self.params.period_ms);
        };

        self.core.stop();

        let report = MotionReport {
            kind: MotionKind::PointTurn,
            target,
            final_value: angle,
            cycles,
            elapsed_ms: self.clock.millis().saturating_sub(start_ms),
        };
        debug!("point_turn: settled {:?}", report);
        self.report = Some(report);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{Actuation, SimChassis, SimChassisParams};
    use crate::odom::{OdomParams, Odometer, Odometry};
    use crate::pid::PidParams;
    use rstest::rstest;
    use util::time::SimClock;

    const TICKS_PER_POWER: f64 = 0.1;

    fn sim() -> Arc<SimChassis> {
        Arc::new(SimChassis::new(SimChassisParams {
            ticks_per_power: TICKS_PER_POWER,
            middle_offset: None,
        }))
    }

    fn ctrl(sim: &Arc<SimChassis>, params: ChassisCtrlParams) -> (ChassisControllerPid, Arc<SimClock>) {
        let clock = Arc::new(SimClock::new());
        let c = ChassisControllerPid::new(sim.clone(), clock.clone(), params).unwrap();
        (c, clock)
    }

    #[test]
    fn test_drive_straight_end_to_end() {
        let sim = sim();
        let params = ChassisCtrlParams {
            distance_pid: PidParams::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        let (mut c, clock) = ctrl(&sim, params);

        c.drive_straight(1000);

        let vals = c.get_encoder_vals();
        assert!((1000.0 - vals.mean_side()).abs() <= 15.0, "{:?}", vals);

        // At full power the plant moves 12.7 ticks per cycle, so arrival
        // takes ceil(985 / 12.7) cycles, then one settle window.
        let max_step = params.power_scale * TICKS_PER_POWER;
        let arrival_cycles = ((1000.0 - 15.0) / max_step).ceil() as u64;
        let window_cycles = (250.0 / 15.0f64).ceil() as u64;
        let bound = arrival_cycles + window_cycles + 3;

        let report = c.last_report().unwrap();
        assert_eq!(report.kind, MotionKind::DriveStraight);
        assert!((1000.0 - report.final_value).abs() <= 15.0);
        assert!(report.cycles <= bound, "{} cycles", report.cycles);
        assert!(report.elapsed_ms <= bound * params.period_ms);
        assert_eq!(clock.millis(), report.elapsed_ms);
    }

    #[rstest]
    #[case(1000)]
    #[case(-500)]
    #[case(0)]
    #[case(40)]
    fn test_drive_straight_ends_with_stop(#[case] target: i32) {
        let sim = sim();
        let (mut c, _clock) = ctrl(&sim, ChassisCtrlParams::default());

        c.drive_straight(target);

        let log = sim.actuation_log();
        assert_eq!(log.last(), Some(&Actuation::Stop));
        assert!(
            log[..log.len() - 1]
                .iter()
                .all(|a| matches!(a, Actuation::DriveVector(..))),
            "only drive_vector expected before the stop"
        );

        let report = c.last_report().unwrap();
        assert!((target as f64 - report.final_value).abs() <= 15.0);
    }

    #[test]
    fn test_drive_straight_is_relative_to_start() {
        let sim = sim();
        let (mut c, _clock) = ctrl(&sim, ChassisCtrlParams::default());

        c.drive_straight(300);
        let first = c.get_encoder_vals();
        c.drive_straight(300);
        let second = c.get_encoder_vals();

        assert!(((second - first).mean_side() - 300.0).abs() <= 15.0);
    }

    /// A chassis whose right side creeps ahead on every drive command.
    struct DriftingChassis {
        inner: Arc<SimChassis>,
        drift_ticks: f64,
    }

    impl ChassisModel for DriftingChassis {
        fn get_sensor_vals(&self) -> crate::model::EncoderReading {
            self.inner.get_sensor_vals()
        }
        fn drive_forward(&self, power: i32) {
            self.inner.drive_forward(power)
        }
        fn drive_vector(&self, dist_power: i32, angle_power: i32) {
            self.inner.drive_vector(dist_power, angle_power);
            self.inner.inject_ticks(0.0, self.drift_ticks, 0.0);
        }
        fn turn_clockwise(&self, power: i32) {
            self.inner.turn_clockwise(power)
        }
        fn stop(&self) {
            self.inner.stop()
        }
        fn tank(&self, left_power: i32, right_power: i32) {
            self.inner.tank(left_power, right_power)
        }
        fn arcade(&self, vertical: i32, horizontal: i32) {
            self.inner.arcade(vertical, horizontal)
        }
        fn left(&self, power: i32) {
            self.inner.left(power)
        }
        fn right(&self, power: i32) {
            self.inner.right(power)
        }
    }

    #[test]
    fn test_drive_straight_corrects_heading() {
        let inner = sim();
        let model = Arc::new(DriftingChassis {
            inner: inner.clone(),
            drift_ticks: 2.0,
        });
        let clock = Arc::new(SimClock::new());
        let mut c = ChassisControllerPid::new(model, clock, ChassisCtrlParams::default()).unwrap();

        c.drive_straight(600);

        // Uncorrected, the drift would build up to over a hundred ticks
        let report = c.last_report().unwrap();
        let vals = c.get_encoder_vals();
        assert!(report.cycles > 50);
        assert!(vals.side_diff().abs() <= 10.0, "{:?}", vals);
        assert!((vals.mean_side() - 600.0).abs() <= 15.0);
        assert_eq!(inner.last_actuation(), Some(Actuation::Stop));
    }

    #[test]
    fn test_drive_straight_stalled_chassis_settles() {
        // A chassis which doesn't move at all settles through stagnation
        let sim = Arc::new(SimChassis::new(SimChassisParams {
            ticks_per_power: 0.0,
            middle_offset: None,
        }));
        let (mut c, clock) = ctrl(&sim, ChassisCtrlParams::default());

        c.drive_straight(1000);

        assert_eq!(sim.last_actuation(), Some(Actuation::Stop));
        assert_eq!(clock.millis(), 255);
        assert_eq!(c.last_report().unwrap().final_value, 0.0);
    }

    #[rstest]
    #[case(90.0, 90.0)]
    #[case(-135.0, -135.0)]
    #[case(450.0, 90.0)]
    #[case(-270.0, 90.0)]
    #[case(180.0, 180.0)]
    #[case(-180.0, 180.0)]
    fn test_point_turn(#[case] degrees: f64, #[case] expected_target: f64) {
        let sim = sim();
        let (mut c, _clock) = ctrl(&sim, ChassisCtrlParams::default());
        let start = c.get_encoder_vals();

        c.point_turn(degrees);

        let report = c.last_report().unwrap();
        assert_eq!(report.kind, MotionKind::PointTurn);
        assert_eq!(report.target, expected_target);

        let turned = (c.get_encoder_vals() - start).side_diff();
        assert!((turned - expected_target).abs() <= 10.0, "turned {}", turned);

        let log = sim.actuation_log();
        assert_eq!(log.last(), Some(&Actuation::Stop));
        assert!(log[..log.len() - 1]
            .iter()
            .all(|a| matches!(a, Actuation::TurnClockwise(_))));
    }

    #[rstest]
    #[case(90.0)]
    #[case(-45.0)]
    fn test_point_turn_positive_is_counter_clockwise(#[case] degrees: f64) {
        let sim = sim();
        let (mut c, _clock) = ctrl(&sim, ChassisCtrlParams::default());

        // One degree of heading per differential tick
        let mut odom = Odometry::new(
            sim.clone(),
            OdomParams {
                turn_scale: 1f64.to_radians(),
                ..Default::default()
            },
        )
        .unwrap();

        c.point_turn(degrees);
        let pose = odom.step();

        // Counter-clockwise needs negative turn_clockwise power
        match sim.actuation_log().first() {
            Some(Actuation::TurnClockwise(p)) => {
                assert_eq!(p.signum(), -(degrees.signum() as i32), "power {}", p)
            }
            other => panic!("unexpected first actuation {:?}", other),
        }

        assert!((pose.theta_deg() - degrees).abs() <= 10.0, "{:?}", pose);
    }

    #[rstest]
    #[case(std::f64::NAN)]
    #[case(std::f64::INFINITY)]
    #[case(std::f64::NEG_INFINITY)]
    fn test_point_turn_non_finite_only_stops(#[case] degrees: f64) {
        let sim = sim();
        let (mut c, clock) = ctrl(&sim, ChassisCtrlParams::default());

        c.drive_straight(100);
        let before = c.get_encoder_vals();
        let log_len = sim.actuation_log().len();
        let now = clock.millis();

        c.point_turn(degrees);

        assert_eq!(&sim.actuation_log()[log_len..], &[Actuation::Stop]);
        assert_eq!(c.get_encoder_vals(), before);
        assert_eq!(clock.millis(), now);
        assert!(c.last_report().is_none());
    }

    #[test]
    fn test_point_turn_keeps_distance() {
        let sim = sim();
        let (mut c, _clock) = ctrl(&sim, ChassisCtrlParams::default());

        c.point_turn(60.0);

        assert!(c.get_encoder_vals().mean_side().abs() <= 1.0);
    }

    #[test]
    fn test_from_params_builds_model() {
        let clock = Arc::new(SimClock::new());
        let mut c = ChassisControllerPid::from_params(
            &SimChassisParams::default(),
            clock,
            ChassisCtrlParams::default(),
        )
        .unwrap();

        c.drive_straight(200);
        assert!((c.get_encoder_vals().mean_side() - 200.0).abs() <= 15.0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let sim = sim();
        let clock = Arc::new(SimClock::new());

        let r = ChassisControllerPid::new(
            sim.clone(),
            clock.clone(),
            ChassisCtrlParams {
                period_ms: 0,
                ..Default::default()
            },
        );
        assert!(matches!(r, Err(ChassisCtrlError::ZeroPeriod)));

        let r = ChassisControllerPid::new(
            sim,
            clock,
            ChassisCtrlParams {
                angle_pid: PidParams::new(std::f64::INFINITY, 0.0, 0.0),
                ..Default::default()
            },
        );
        assert!(matches!(r, Err(ChassisCtrlError::InvalidPid("angle", _))));
    }
}
