//! Main chassis executable entry point.
//!
//! # Architecture
//!
//! The executable drives a simulated chassis around a square:
//!
//!     - Initialise the session and logging
//!     - Load the controller, odometry and simulation parameters
//!     - Build the chassis model and spawn the odometry task on it
//!     - For each side of the square:
//!         - Drive straight along the side
//!         - Point turn onto the next side
//!         - Archive the motion report and log the pose
//!     - Stop odometry and report the final pose

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;
use std::sync::Arc;

// Internal
use chassis_lib::{
    chassis_ctrl::{ChassisController, ChassisControllerPid, ChassisCtrlParams},
    model::{ChassisModel, ChassisModelParams, SimChassisParams},
    odom::{OdomParams, OdomTask, PoseHandle, ThreeEncoderOdometry},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::{Clock, SystemClock},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of sides of the driven route.
const NUM_SIDES: usize = 4;

/// Length of each side of the route.
///
/// Units: encoder ticks
const SIDE_LENGTH_TICKS: i32 = 600;

/// Turn made at each corner.
///
/// Units: degrees
const CORNER_TURN_DEG: f64 = 90.0;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("chassis_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Chassis Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let ctrl_params: ChassisCtrlParams =
        util::params::load("chassis_ctrl.toml").wrap_err("Could not load chassis control params")?;
    let odom_params: OdomParams =
        util::params::load("odom.toml").wrap_err("Could not load odometry params")?;
    let sim_params: SimChassisParams =
        util::params::load("sim_chassis.toml").wrap_err("Could not load simulation params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let model: Arc<dyn ChassisModel> = sim_params.make();

    let odom = ThreeEncoderOdometry::new(model.clone(), odom_params)
        .wrap_err("Failed to initialise odometry")?;
    let odom_task = OdomTask::spawn(
        odom,
        clock.clone(),
        odom_params.period_ms,
        Some(
            Archiver::from_path(&session, "odom/pose.csv")
                .wrap_err("Failed to create the pose archive")?,
        ),
    )
    .wrap_err("Failed to start odometry")?;
    let pose = odom_task.pose();

    let mut ctrl = ChassisControllerPid::new(model, clock, ctrl_params)
        .wrap_err("Failed to initialise ChassisCtrl")?;
    let mut motion_arch = Archiver::from_path(&session, "chassis_ctrl/motions.csv")
        .wrap_err("Failed to create the motion archive")?;

    info!("Module initialisation complete\n");

    // ---- MAIN SEQUENCE ----

    info!("Driving a square of side {} ticks\n", SIDE_LENGTH_TICKS);

    for side in 0..NUM_SIDES {
        info!("Side {}", side);

        ctrl.drive_straight(SIDE_LENGTH_TICKS);
        report_motion(&ctrl, &pose, &mut motion_arch)?;

        ctrl.point_turn(CORNER_TURN_DEG);
        report_motion(&ctrl, &pose, &mut motion_arch)?;
    }

    // ---- SHUTDOWN ----

    odom_task.stop().wrap_err("Failed to stop odometry")?;

    let p = pose.get();
    info!(
        "Final pose ({:.1}, {:.1}) heading {:.1} deg, {:.1} from the start",
        p.x,
        p.y,
        p.theta_deg(),
        p.position().norm()
    );
    info!("End of execution");

    Ok(())
}

/// Log and archive the last motion performed by the controller.
fn report_motion(
    ctrl: &ChassisControllerPid,
    pose: &PoseHandle,
    arch: &mut Archiver,
) -> Result<(), Report> {
    if let Some(report) = ctrl.last_report() {
        info!(
            "{:?} to {:.1} ended at {:.1} after {} cycles ({} ms)",
            report.kind, report.target, report.final_value, report.cycles, report.elapsed_ms
        );
        arch.serialise(report)
            .wrap_err("Failed to archive the motion report")?;
    }

    let p = pose.get();
    info!(
        "Pose: ({:.1}, {:.1}) heading {:.1} deg",
        p.x,
        p.y,
        p.theta_deg()
    );

    Ok(())
}
