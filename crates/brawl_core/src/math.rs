//! Heading math and force curves.
//!
//! Headings are yaw degrees in the horizontal plane, kept in `[0, 360)`.
//! Steering always takes the shortest arc between two headings, computed
//! with the signed-difference form rather than branch ladders, so a homing
//! projectile at 350 degrees chasing a target at 10 degrees turns 20
//! degrees through north instead of 340 degrees the long way round.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Wrap a yaw angle into `[0, 360)`.
#[must_use]
pub fn wrap_yaw(yaw: f32) -> f32 {
    yaw.rem_euclid(360.0)
}

/// Signed shortest-arc difference from `current` to `target`, in
/// `[-180, 180)`. Positive means turning clockwise (increasing yaw) is
/// shorter.
#[must_use]
pub fn signed_arc(current: f32, target: f32) -> f32 {
    (target - current + 180.0).rem_euclid(360.0) - 180.0
}

/// Turn `current` toward `target` by at most `max_step` degrees along the
/// shortest arc. Never overshoots: if the remaining arc is smaller than the
/// step, the result is exactly `target`.
#[must_use]
pub fn steer_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let arc = signed_arc(current, target);
    if arc.abs() <= max_step {
        wrap_yaw(target)
    } else {
        wrap_yaw(current + arc.signum() * max_step)
    }
}

/// Unit direction vector for a yaw heading (degrees), horizontal plane.
#[must_use]
pub fn yaw_to_dir(yaw: f32) -> Vec3 {
    let r = yaw.to_radians();
    Vec3::new(r.sin(), 0.0, r.cos())
}

/// Yaw heading (degrees, `[0, 360)`) of the horizontal line from `from`
/// to `to`. Returns `None` when the points coincide horizontally.
#[must_use]
pub fn bearing(from: Vec3, to: Vec3) -> Option<f32> {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    if dx == 0.0 && dz == 0.0 {
        return None;
    }
    Some(wrap_yaw(dx.atan2(dz).to_degrees()))
}

/// Horizontal (ground-plane) squared distance.
#[must_use]
pub fn horizontal_distance_squared(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// Piecewise-linear spring used by tethers, wards, and grapples.
///
/// Zero force inside `inner`, a linear ramp of `slope` per metre out to
/// `outer`, and a clamp at `max` beyond it - so a hooked unit is never
/// yanked when it is already close, and never accelerated without bound
/// when it is far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringProfile {
    /// Dead zone radius: no force inside.
    pub inner: f32,
    /// End of the linear ramp.
    pub outer: f32,
    /// Force clamp beyond the ramp.
    pub max: f32,
    /// Ramp slope, force per metre past `inner`.
    pub slope: f32,
}

impl SpringProfile {
    /// Force magnitude at separation `distance`.
    #[must_use]
    pub fn force_at(self, distance: f32) -> f32 {
        if distance <= self.inner {
            0.0
        } else if distance >= self.outer {
            self.max
        } else {
            (self.slope * (distance - self.inner)).min(self.max)
        }
    }

    /// Force vector pulling a body at `from` toward `to`.
    #[must_use]
    pub fn pull(self, from: Vec3, to: Vec3) -> Vec3 {
        let delta = to - from;
        let distance = delta.length();
        if distance <= f32::EPSILON {
            return Vec3::ZERO;
        }
        delta / distance * self.force_at(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn arc_is_zero_for_equal_headings() {
        assert!(signed_arc(0.0, 0.0).abs() < f32::EPSILON);
        assert!(signed_arc(359.0, 359.0).abs() < f32::EPSILON);
    }

    #[test]
    fn arc_crosses_north_the_short_way() {
        // 350 -> 10 is +20 through north, not -340.
        assert!((signed_arc(350.0, 10.0) - 20.0).abs() < 1e-4);
        assert!((signed_arc(10.0, 350.0) + 20.0).abs() < 1e-4);
    }

    #[test]
    fn arc_boundary_cases() {
        // Opposite headings map to the -180 end of the half-open range.
        assert!((signed_arc(0.0, 180.0) + 180.0).abs() < 1e-4);
        assert!((signed_arc(0.0, 359.0) + 1.0).abs() < 1e-4);
        assert!((signed_arc(359.0, 0.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn steer_reaches_target_exactly_when_close() {
        let out = steer_toward(355.0, 5.0, 15.0);
        assert!((out - 5.0).abs() < 1e-4);
    }

    #[test]
    fn steer_is_bounded_by_step() {
        let out = steer_toward(0.0, 90.0, 5.0);
        assert!((out - 5.0).abs() < 1e-4);
        let out = steer_toward(0.0, 270.0, 5.0);
        assert!((out - 355.0).abs() < 1e-4);
    }

    #[test]
    fn bearing_matches_axes() {
        let b = bearing(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)).unwrap();
        assert!(b.abs() < 1e-4);
        let b = bearing(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert!((b - 90.0).abs() < 1e-4);
    }

    #[test]
    fn bearing_rejects_coincident_points() {
        assert!(bearing(Vec3::ONE, Vec3::ONE).is_none());
        // Vertically stacked points have no horizontal bearing either.
        assert!(bearing(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0)).is_none());
    }

    #[test]
    fn spring_profile_shape() {
        let spring = SpringProfile {
            inner: 7.5,
            outer: 12.5,
            max: 2.5,
            slope: 0.5,
        };
        assert!(spring.force_at(5.0).abs() < f32::EPSILON);
        assert!(spring.force_at(7.5).abs() < f32::EPSILON);
        assert!((spring.force_at(10.0) - 1.25).abs() < 1e-5);
        assert!((spring.force_at(12.5) - 2.5).abs() < 1e-5);
        assert!((spring.force_at(100.0) - 2.5).abs() < 1e-5);
    }

    #[test]
    fn spring_pull_points_at_the_anchor() {
        let spring = SpringProfile {
            inner: 1.0,
            outer: 5.0,
            max: 4.0,
            slope: 1.0,
        };
        let f = spring.pull(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO);
        assert!(f.x < 0.0);
        assert!(f.y.abs() < f32::EPSILON && f.z.abs() < f32::EPSILON);
        assert!(spring.pull(Vec3::ZERO, Vec3::ZERO).length() < f32::EPSILON);
    }

    proptest! {
        #[test]
        fn arc_stays_in_half_open_range(current in 0.0f32..360.0, target in 0.0f32..360.0) {
            let arc = signed_arc(current, target);
            prop_assert!(arc >= -180.0 && arc < 180.0);
        }

        #[test]
        fn steering_never_increases_the_remaining_arc(
            current in 0.0f32..360.0,
            target in 0.0f32..360.0,
            step in 0.1f32..45.0,
        ) {
            let next = steer_toward(current, target, step);
            let before = signed_arc(current, target).abs();
            let after = signed_arc(next, target).abs();
            prop_assert!(after <= before + 1e-3);
        }
    }
}
