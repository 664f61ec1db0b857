//! # Chassis library.
//!
//! This library allows other crates in the workspace to access items defined inside the chassis
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Chassis model - the sensor and actuator interface to a differential chassis
pub mod model;

/// PID controller - a single discrete-time regulator
pub mod pid;

/// Settle detection - decides when a regulated motion has finished
pub mod settle;

/// Chassis control module - converts distance and turn commands into actuation
pub mod chassis_ctrl;

/// Odometry module - estimates where the chassis is from its encoders
pub mod odom;
