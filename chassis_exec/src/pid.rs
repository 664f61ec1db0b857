//! # PID controller module
//!
//! A discrete, fixed-period PID regulator. The control loop which owns the
//! regulator steps it exactly once per cycle, so the sample time is a
//! constant given at construction.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains and output limits of a PID controller.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PidParams {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Dervative gain
    pub k_d: f64,

    /// Lowest output value
    #[serde(default = "default_min_output")]
    pub min_output: f64,

    /// Highest output value
    #[serde(default = "default_max_output")]
    pub max_output: f64,
}

/// A PID controller
#[derive(Debug, Clone, Serialize)]
pub struct PidController {
    params: PidParams,

    /// Sample time in seconds
    dt_s: f64,

    /// The set point
    target: f64,

    /// Error on the previous step
    prev_error: f64,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors in the configuration of a PID controller.
#[derive(Debug, Error, PartialEq)]
pub enum PidError {
    #[error("Sample time must be positive and finite, found {0} s")]
    InvalidSampleTime(f64),

    #[error("Gains must be finite, found {0:?}")]
    NonFiniteGain(PidParams),

    #[error("Output range is empty: [{0}, {1}]")]
    InvalidOutputRange(f64, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidParams {
    /// Gains with the default `[-1, 1]` output range.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            min_output: default_min_output(),
            max_output: default_max_output(),
        }
    }
}

impl PidController {
    /// Create a new controller with the given gains, stepped every `dt_s`
    /// seconds.
    pub fn new(params: PidParams, dt_s: f64) -> Result<Self, PidError> {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return Err(PidError::InvalidSampleTime(dt_s));
        }
        if ![params.k_p, params.k_i, params.k_d].iter().all(|k| k.is_finite()) {
            return Err(PidError::NonFiniteGain(params));
        }
        if !(params.min_output < params.max_output) {
            return Err(PidError::InvalidOutputRange(
                params.min_output,
                params.max_output,
            ));
        }

        Ok(Self {
            params,
            dt_s,
            target: 0.0,
            prev_error: 0.0,
            integral: 0.0,
        })
    }

    /// Set the set point.
    ///
    /// When starting an unrelated motion call `reset` as well, otherwise the
    /// history of the last motion is carried into the new one.
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Clear the integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }

    /// Step the controller with a new measurement, returning the clamped
    /// output.
    pub fn step(&mut self, measurement: f64) -> f64 {
        let error = self.target - measurement;

        self.integral += error * self.dt_s;
        let deriv = (error - self.prev_error) / self.dt_s;

        let out = self.params.k_p * error + self.params.k_i * self.integral + self.params.k_d * deriv;

        self.prev_error = error;

        clamp(out, self.params.min_output, self.params.max_output)
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// The error seen on the last step.
    pub fn error(&self) -> f64 {
        self.prev_error
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn params(&self) -> &PidParams {
        &self.params
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_min_output() -> f64 {
    -1.0
}

fn default_max_output() -> f64 {
    1.0
}
