//! Mirror-side position correction.
//!
//! Non-authoritative copies of an entity integrate their own motion each
//! presentation step, then lerp toward the latest authoritative sample so
//! small divergence is corrected smoothly instead of snapping. Teleports
//! deliberately bypass this path: they arrive as discrete events and are
//! applied as hard sets.

use glam::Vec3;

/// Fraction of the remaining error corrected per presentation step.
pub const CORRECTION_FACTOR: f32 = 0.5;

/// Latest authoritative sample plus smoothing toward it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpolator {
    target: Option<(Vec3, f32)>,
}

impl Interpolator {
    /// Create an interpolator with no sample yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an authoritative position/heading sample.
    pub fn observe(&mut self, position: Vec3, yaw: f32) {
        self.target = Some((position, yaw));
    }

    /// Discrete move: clear the smoothing target so the next sample after a
    /// teleport does not drag the mirror back across the map.
    pub fn reset(&mut self) {
        self.target = None;
    }

    /// Correct a locally integrated position toward the last sample.
    /// Returns the input unchanged when no sample has arrived.
    #[must_use]
    pub fn correct(&self, position: Vec3, yaw: f32) -> (Vec3, f32) {
        match self.target {
            Some((tp, ty)) => {
                // Heading error measured along the shortest arc, so a
                // correction across the 0/360 seam never swings the long
                // way around.
                let delta = (ty - yaw + 180.0).rem_euclid(360.0) - 180.0;
                (
                    position.lerp(tp, CORRECTION_FACTOR),
                    yaw + delta * CORRECTION_FACTOR,
                )
            }
            None => (position, yaw),
        }
    }
}
