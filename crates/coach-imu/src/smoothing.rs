use glam::{Quat, Vec3};
use std::time::Duration;

/// Exponential smoothing for orientation and position streams.
///
/// Each tick blends the stored state toward the newest raw value: slerp for
/// rotations, lerp for positions. The blend factor is frame-rate independent,
/// `k = 1 − exp(−responsiveness · dt)`, so a 30 Hz and a 120 Hz host converge
/// at the same wall-clock rate. Higher responsiveness tracks faster and
/// smooths less; the original tuning of ~5-10/s suits squat-speed motion.
///
/// Call at most once per simulation tick. The first sample snaps directly.
#[derive(Debug, Clone, Copy)]
pub struct MotionSmoother {
    responsiveness: f32,
    rotation: Option<Quat>,
    position: Option<Vec3>,
}

impl MotionSmoother {
    pub fn new(responsiveness: f32) -> Self {
        Self {
            responsiveness,
            rotation: None,
            position: None,
        }
    }

    /// Blend toward `raw` and return the smoothed rotation.
    ///
    /// Non-finite input is ignored; the previous smoothed value is returned
    /// unchanged so sensor glitches never reach the stored state.
    pub fn smooth_rotation(&mut self, raw: Quat, dt: Duration) -> Quat {
        if !raw.is_finite() {
            tracing::trace!("Dropping non-finite rotation sample");
            return self.rotation.unwrap_or(Quat::IDENTITY);
        }
        let blended = match self.rotation {
            None => raw,
            Some(current) => current.slerp(raw, self.blend_factor(dt)),
        };
        self.rotation = Some(blended);
        blended
    }

    /// Blend toward `raw` and return the smoothed position.
    pub fn smooth_position(&mut self, raw: Vec3, dt: Duration) -> Vec3 {
        if !raw.is_finite() {
            tracing::trace!("Dropping non-finite position sample");
            return self.position.unwrap_or(Vec3::ZERO);
        }
        let blended = match self.position {
            None => raw,
            Some(current) => current.lerp(raw, self.blend_factor(dt)),
        };
        self.position = Some(blended);
        blended
    }

    /// Forget the stored state; the next sample snaps.
    pub fn reset(&mut self) {
        self.rotation = None;
        self.position = None;
    }

    fn blend_factor(&self, dt: Duration) -> f32 {
        1.0 - (-self.responsiveness * dt.as_secs_f32()).exp()
    }
}
