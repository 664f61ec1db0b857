//! Three encoder odometry
//!
//! Adds a middle encoder, mounted perpendicular to the side encoders, which
//! measures lateral motion directly. Heading still comes from the side
//! differential, so heading and lateral displacement are independent
//! measurements.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use std::sync::Arc;

// Internal
use super::{OdomError, OdomParams, Odometer, Odometry, Pose, PoseHandle};
use crate::model::ChassisModel;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Odometry from the two side encoders and a perpendicular middle encoder.
///
/// Extends the two encoder [`Odometry`] with the lateral distance measured by
/// the middle encoder.
pub struct ThreeEncoderOdometry {
    base: Odometry,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ThreeEncoderOdometry {
    /// Start odometry at the origin, from the model's current encoder values.
    ///
    /// Fails if the model doesn't report a middle encoder.
    pub fn new(model: Arc<dyn ChassisModel>, params: OdomParams) -> Result<Self, OdomError> {
        params.validate_three_encoder()?;

        let base = Odometry::start(model, params);
        let ticks = base.last_ticks();
        let middle = ticks.middle.ok_or(OdomError::NoMiddleEncoder)?;

        info!(
            "Three encoder odometry started at L {} R {} M {}",
            ticks.left, ticks.right, middle
        );

        Ok(Self { base })
    }

    pub fn params(&self) -> &OdomParams {
        self.base.params()
    }
}

impl Odometer for ThreeEncoderOdometry {
    fn step(&mut self) -> Pose {
        let middle_scale = self.base.params().middle_scale;

        self.base
            .step_with(|delta| delta.middle.unwrap_or(0) as f64 * middle_scale)
    }

    fn pose(&self) -> PoseHandle {
        self.base.pose()
    }
}
