//! Scalar helpers shared by the map implementations.
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`distance_modulus`] | kpc → distance modulus, `5 log10(d) + 10` |
//! | [`distance_from_modulus`] | distance modulus → kpc |
//! | [`wrap_degrees`] | longitude into `[0, 360)` |
//! | [`vincenty_angular_separation`] | great-circle separation in radians |

use crate::constants::DISTMOD_AT_1_KPC;

#[inline]
pub fn fmod(x: f64, y: f64) -> f64 {
    libm::fmod(x, y)
}

/// Distance modulus for a distance in kiloparsecs.
///
/// Zero or negative distances yield `-inf` or NaN; callers keep distances sane.
///
/// ```
/// use dust_core::math::distance_modulus;
/// assert_eq!(distance_modulus(1.0), 10.0);
/// assert!((distance_modulus(0.1) - 5.0).abs() < 1e-12);
/// ```
#[inline]
pub fn distance_modulus(distance_kpc: f64) -> f64 {
    5.0 * libm::log10(distance_kpc) + DISTMOD_AT_1_KPC
}

/// Distance in kiloparsecs for a distance modulus.
#[inline]
pub fn distance_from_modulus(distmod: f64) -> f64 {
    libm::pow(10.0, (distmod - DISTMOD_AT_1_KPC) / 5.0)
}

/// Wraps a longitude in degrees into `[0, 360)`.
#[inline]
pub fn wrap_degrees(lon_deg: f64) -> f64 {
    let wrapped = fmod(lon_deg, 360.0);
    let wrapped = if wrapped < 0.0 { wrapped + 360.0 } else { wrapped };
    // -1e-17 + 360 rounds to 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[inline]
pub fn vincenty_angular_separation(
    sin_lat1: f64,
    cos_lat1: f64,
    sin_lat2: f64,
    cos_lat2: f64,
    delta_lon: f64,
) -> f64 {
    let (sin_delta_lon, cos_delta_lon) = libm::sincos(delta_lon);

    let num = libm::sqrt(
        (cos_lat2 * sin_delta_lon).powi(2)
            + (cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_delta_lon).powi(2),
    );
    let den = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_delta_lon;

    libm::atan2(num, den)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_modulus_known_values() {
        assert_eq!(distance_modulus(1.0), 10.0);
        assert_relative_eq!(distance_modulus(10.0), 15.0, epsilon = 1e-12);
        assert_relative_eq!(distance_modulus(0.01), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_modulus_round_trip() {
        for &d in &[1e-3, 0.0631, 0.5, 1.0, 2.7, 8.2, 50.0, 1234.5] {
            let back = distance_from_modulus(distance_modulus(d));
            assert_relative_eq!(back, d, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_distance_modulus_non_positive() {
        assert_eq!(distance_modulus(0.0), f64::NEG_INFINITY);
        assert!(distance_modulus(-1.0).is_nan());
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_relative_eq!(wrap_degrees(-10.0), 350.0);
        assert_relative_eq!(wrap_degrees(725.0), 5.0);
        assert!(wrap_degrees(-1e-17) < 360.0);
    }

    #[test]
    fn test_vincenty_quarter_circle() {
        let sep = vincenty_angular_separation(0.0, 1.0, 0.0, 1.0, crate::constants::HALF_PI);
        assert_relative_eq!(sep, crate::constants::HALF_PI, epsilon = 1e-12);
    }
}
