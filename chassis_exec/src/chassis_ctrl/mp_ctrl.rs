//! Motion profile chassis controller
//!
//! Hands both motions to a [`ProfileFollower`], which generates and tracks a
//! motion profile. Profile generation is provided by the follower, this
//! controller only guarantees the shared motion contract.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use std::sync::Arc;

// Internal
use super::{ChassisController, ChassisCore};
use crate::model::{ChassisModel, ChassisModelParams};
use util::maths::wrap_deg_180;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Follows a motion profile on a chassis.
///
/// Both methods shall block until the profile has been completed.
pub trait ProfileFollower: Send {
    /// Follow a straight line profile of `distance` encoder ticks.
    fn follow_straight(&mut self, model: &dyn ChassisModel, distance: f64);

    /// Follow an on the spot turn profile of `degrees`, already normalised
    /// into `(-180, 180]`.
    fn follow_turn(&mut self, model: &dyn ChassisModel, degrees: f64);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Chassis controller driven by a motion profile follower.
pub struct ChassisControllerMp {
    core: ChassisCore,
    follower: Box<dyn ProfileFollower>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisControllerMp {
    pub fn new(model: Arc<dyn ChassisModel>, follower: Box<dyn ProfileFollower>) -> Self {
        Self {
            core: ChassisCore::new(model),
            follower,
        }
    }

    /// Create a new controller, building the model from its parameters.
    pub fn from_params<M>(model_params: &M, follower: Box<dyn ProfileFollower>) -> Self
    where
        M: ChassisModelParams + ?Sized,
    {
        Self::new(model_params.make(), follower)
    }
}

impl ChassisController for ChassisControllerMp {
    fn core(&self) -> &ChassisCore {
        &self.core
    }

    fn drive_straight(&mut self, target: i32) {
        debug!("drive_straight (profile): target {} ticks", target);

        self.follower
            .follow_straight(self.core.model().as_ref(), target as f64);
        self.core.stop();
    }

    fn point_turn(&mut self, degrees: f64) {
        if !degrees.is_finite() {
            warn!("point_turn (profile): ignoring non-finite target {}", degrees);
            self.core.stop();
            return;
        }

        let target = wrap_deg_180(degrees);
        debug!("point_turn (profile): target {:.1}", target);

        self.follower.follow_turn(self.core.model().as_ref(), target);
        self.core.stop();
    }
}
