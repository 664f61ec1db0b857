//! Parameters structure for odometry

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{check_scale, OdomError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Calibration and timing of odometry.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OdomParams {
    /// Distance travelled per tick of the mean side encoders.
    pub scale: f64,

    /// Heading change per tick of side differential (right - left).
    ///
    /// Units: radians/tick
    pub turn_scale: f64,

    /// Lateral distance per tick of the middle encoder. Only used by three
    /// encoder odometry.
    #[serde(default = "default_middle_scale")]
    pub middle_scale: f64,

    /// Period of the odometry loop.
    ///
    /// Units: milliseconds
    pub period_ms: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for OdomParams {
    /// Unit distance scales, and one degree of heading per differential tick.
    fn default() -> Self {
        Self {
            scale: 1.0,
            turn_scale: 1f64.to_radians(),
            middle_scale: default_middle_scale(),
            period_ms: 10,
        }
    }
}

impl OdomParams {
    /// Check the parameters used by two encoder odometry.
    pub fn validate(&self) -> Result<(), OdomError> {
        check_scale("distance", self.scale)?;
        check_scale("turn", self.turn_scale)?;

        if self.period_ms == 0 {
            return Err(OdomError::ZeroPeriod);
        }

        Ok(())
    }

    /// Check the parameters used by three encoder odometry.
    pub fn validate_three_encoder(&self) -> Result<(), OdomError> {
        self.validate()?;
        check_scale("middle", self.middle_scale)
    }
}

fn default_middle_scale() -> f64 {
    1.0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_odom_params_validation() {
        assert!(OdomParams::default().validate_three_encoder().is_ok());

        let p = OdomParams {
            scale: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(OdomError::InvalidScale("distance", _))
        ));

        let p = OdomParams {
            turn_scale: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(OdomError::InvalidScale("turn", _))));

        let p = OdomParams {
            period_ms: 0,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(OdomError::ZeroPeriod)));

        // The middle scale only matters with three encoders
        let p = OdomParams {
            middle_scale: -1.0,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
        assert!(matches!(
            p.validate_three_encoder(),
            Err(OdomError::InvalidScale("middle", _))
        ));
    }

    #[test]
    fn test_odom_params_from_toml() {
        let p: OdomParams = util::params::from_str(
            r#"
            scale = 0.5
            turn_scale = 0.01
            period_ms = 10
            "#,
        )
        .unwrap();

        assert_eq!(p.scale, 0.5);
        assert_eq!(p.middle_scale, 1.0);
        assert!(p.validate().is_ok());
    }
}
