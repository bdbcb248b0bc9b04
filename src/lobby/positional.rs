//! Positional audio attenuation.

use crate::protocol::types::Vec3;

/// Linear falloff gain for a source heard from `listener`.
///
/// Full volume inside `min_distance`, silence beyond `max_distance`, linear
/// interpolation between the two. `max_distance <= min_distance` is rejected
/// by [`crate::config::validation::validate`], so callers can assume a
/// well-formed range here.
#[must_use]
pub fn compute_gain(listener: Vec3, source: Vec3, min_distance: f32, max_distance: f32) -> f32 {
    let distance = listener.distance(&source);
    if distance <= min_distance {
        return 1.0;
    }
    if distance >= max_distance {
        return 0.0;
    }
    1.0 - (distance - min_distance) / (max_distance - min_distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_gain_within_min_distance() {
        let a = Vec3::zero();
        let b = Vec3 { x: 0.5, y: 0.0, z: 0.0 };
        assert_eq!(compute_gain(a, b, 1.0, 10.0), 1.0);
    }

    #[test]
    fn zero_gain_beyond_max_distance() {
        let a = Vec3::zero();
        let b = Vec3 { x: 100.0, y: 0.0, z: 0.0 };
        assert_eq!(compute_gain(a, b, 1.0, 10.0), 0.0);
    }

    #[test]
    fn linear_falloff_midpoint() {
        let a = Vec3::zero();
        let b = Vec3 { x: 5.5, y: 0.0, z: 0.0 };
        let gain = compute_gain(a, b, 1.0, 10.0);
        assert!((gain - 0.5).abs() < 1e-5);
    }
}
