use glam::{Quat, Vec3};
use std::time::Duration;

/// Scripted motion generator used when no phone is streaming.
///
/// Reproduces the conditions of a real session: the phone sits in a crooked
/// pocket (a constant 15-degree mount tilt, so calibration actually matters)
/// and the wearer performs endless squat cycles — stand, descend, hold at
/// the bottom, ascend. The generated attitude chases the scripted target
/// with the same slerp chase the real device stream exhibits, so the output
/// is believably smooth rather than stepwise.
pub struct SimulatedMotion {
    raw: Quat,
    cycle_clock: f32,
    chase_rate: f32,
}

/// Seconds per phase: stand, descend, hold, ascend.
const STAND_S: f32 = 2.0;
const DESCEND_S: f32 = 1.5;
const HOLD_S: f32 = 1.0;
const ASCEND_S: f32 = 1.5;
const CYCLE_S: f32 = STAND_S + DESCEND_S + HOLD_S + ASCEND_S;

/// Mount tilt from the phone sitting crooked in the pocket.
const POCKET_TILT_DEG: f32 = 15.0;
/// Peak forward lean at the bottom of the squat.
const BOTTOM_DEG: f32 = 90.0;

impl SimulatedMotion {
    pub fn new() -> Self {
        Self {
            raw: Quat::from_rotation_x(POCKET_TILT_DEG.to_radians()),
            cycle_clock: 0.0,
            chase_rate: 5.0,
        }
    }

    /// Advance the script by `dt` and return (attitude, linear acceleration).
    pub fn step(&mut self, dt: Duration) -> (Quat, Vec3) {
        let dt = dt.as_secs_f32();
        self.cycle_clock = (self.cycle_clock + dt) % CYCLE_S;

        let (lean_deg, accel) = self.scripted_pose(self.cycle_clock);
        let target = Quat::from_rotation_x((POCKET_TILT_DEG + lean_deg).to_radians());

        let k = 1.0 - (-self.chase_rate * dt).exp();
        self.raw = self.raw.slerp(target, k);
        (self.raw, accel)
    }

    /// Target lean angle (degrees) and rough body acceleration at a point in
    /// the cycle.
    fn scripted_pose(&self, t: f32) -> (f32, Vec3) {
        if t < STAND_S {
            (0.0, Vec3::ZERO)
        } else if t < STAND_S + DESCEND_S {
            let progress = (t - STAND_S) / DESCEND_S;
            (BOTTOM_DEG * progress, Vec3::new(0.0, -1.2, 0.0))
        } else if t < STAND_S + DESCEND_S + HOLD_S {
            (BOTTOM_DEG, Vec3::ZERO)
        } else {
            let progress = (t - STAND_S - DESCEND_S - HOLD_S) / ASCEND_S;
            (BOTTOM_DEG * (1.0 - progress), Vec3::new(0.0, 1.2, 0.0))
        }
    }
}

impl Default for SimulatedMotion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bend_deg(q: Quat) -> f32 {
        let up = q * Vec3::Y;
        up.dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees()
    }

    #[test]
    fn rest_pose_shows_pocket_tilt() {
        let mut sim = SimulatedMotion::new();
        let mut attitude = Quat::IDENTITY;
        // Let the chase settle during the standing phase.
        for _ in 0..60 {
            (attitude, _) = sim.step(Duration::from_millis(16));
        }
        assert!((bend_deg(attitude) - POCKET_TILT_DEG).abs() < 2.0);
    }

    #[test]
    fn cycle_reaches_bottom_and_returns() {
        let mut sim = SimulatedMotion::new();
        let mut max_bend = 0.0_f32;
        let mut attitude = Quat::IDENTITY;

        // One full cycle at 60 Hz.
        let steps = (CYCLE_S / 0.016).ceil() as usize;
        for _ in 0..steps {
            (attitude, _) = sim.step(Duration::from_millis(16));
            max_bend = max_bend.max(bend_deg(attitude));
        }

        // Deep enough to trip the 75-degree bottom threshold even after the
        // mount tilt is calibrated out.
        assert!(max_bend > 90.0, "max bend {max_bend} too shallow");

        // Run the standing phase of the next cycle; we should be upright-ish.
        for _ in 0..100 {
            (attitude, _) = sim.step(Duration::from_millis(16));
        }
        assert!(bend_deg(attitude) < POCKET_TILT_DEG + 5.0);
    }

    #[test]
    fn output_is_always_finite_and_unit() {
        let mut sim = SimulatedMotion::new();
        for _ in 0..1000 {
            let (q, a) = sim.step(Duration::from_millis(7));
            assert!(q.is_finite() && a.is_finite());
            assert!((q.length() - 1.0).abs() < 1e-3);
        }
    }
}
