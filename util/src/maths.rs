//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit `value` to the closed range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    value.max(min).min(max)
}

/// Normalise an angle in degrees into the half-open range `(-180, 180]`.
///
/// The result differs from `deg` by a whole number of turns, and is the
/// shortest signed rotation equivalent to `deg`.
pub fn wrap_deg_180<T>(deg: T) -> T
where
    T: Float,
{
    wrap_half_turn(deg, T::from(360.0).unwrap())
}

/// Normalise an angle in radians into the half-open range `(-pi, pi]`.
pub fn wrap_rad_pi<T>(rad: T) -> T
where
    T: Float,
{
    wrap_half_turn(rad, T::from(std::f64::consts::TAU).unwrap())
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// Due to floating point round-off the result can be equal to `rhs.abs()`
/// when `lhs` is a small negative number.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Wrap `value` into `(-turn/2, turn/2]`.
fn wrap_half_turn<T>(value: T, turn: T) -> T
where
    T: Float,
{
    let half = turn / T::from(2.0).unwrap();

    // Values already in range are returned untouched so that exact inputs
    // stay exact.
    if value > -half && value <= half {
        return value;
    }

    let wrapped = half - rem_euclid(half - value, turn);

    if wrapped <= -half {
        wrapped + turn
    } else {
        wrapped
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    const TAU: f64 = std::f64::consts::TAU;
    const PI: f64 = std::f64::consts::PI;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(90.0, 90.0)]
    #[case(180.0, 180.0)]
    #[case(-180.0, 180.0)]
    #[case(181.0, -179.0)]
    #[case(270.0, -90.0)]
    #[case(360.0, 0.0)]
    #[case(540.0, 180.0)]
    #[case(-540.0, 180.0)]
    #[case(-190.0, 170.0)]
    #[case(725.0, 5.0)]
    #[case(-3600.5, -0.5)]
    fn test_wrap_deg_180(#[case] input: f64, #[case] expected: f64) {
        assert!((wrap_deg_180(input) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_deg_180_range_and_turns() {
        let mut deg = -10_000.0;
        while deg < 10_000.0 {
            let w = wrap_deg_180(deg);
            assert!(w > -180.0 && w <= 180.0, "{} wrapped to {}", deg, w);

            let turns = (deg - w) / 360.0;
            assert!((turns - turns.round()).abs() < 1e-9);

            deg += 7.3;
        }
    }

    #[test]
    fn test_wrap_rad_pi() {
        assert_eq!(wrap_rad_pi(1.0), 1.0);
        assert!((wrap_rad_pi(-PI) - PI).abs() < 1e-12);
        assert!((wrap_rad_pi(PI + 0.5) - (-PI + 0.5)).abs() < 1e-12);
        assert!((wrap_rad_pi(3.0 * TAU + 0.25) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(2.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-2.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.25, -1.0, 1.0), 0.25);
    }
}
