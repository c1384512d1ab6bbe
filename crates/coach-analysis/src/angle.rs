use glam::{Quat, Vec3};

/// Scalar bend angle of a calibrated attitude, in degrees within [0, 180].
///
/// Rotates the body-fixed up axis by `attitude` and measures the angle to
/// world up. Standing straight gives ~0; folded in half gives ~180. Pure
/// function; the sole input to the rep state machine.
///
/// Non-finite attitudes yield NaN — the analyzer treats that as a skipped
/// tick rather than letting it into stored state.
pub fn bend_angle(attitude: Quat) -> f32 {
    if !attitude.is_finite() {
        return f32::NAN;
    }
    let up = attitude * Vec3::Y;
    up.dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_zero_degrees() {
        assert!(bend_angle(Quat::IDENTITY).abs() < 1e-4);
    }

    #[test]
    fn quarter_turn_is_ninety() {
        let q = Quat::from_rotation_x(90.0_f32.to_radians());
        assert!((bend_angle(q) - 90.0).abs() < 1e-3);
    }

    #[test]
    fn half_turn_is_one_eighty() {
        let q = Quat::from_rotation_z(180.0_f32.to_radians());
        assert!((bend_angle(q) - 180.0).abs() < 1e-2);
    }

    #[test]
    fn axis_does_not_matter_only_tilt_from_vertical() {
        let forward = Quat::from_rotation_x(45.0_f32.to_radians());
        let sideways = Quat::from_rotation_z(45.0_f32.to_radians());
        assert!((bend_angle(forward) - bend_angle(sideways)).abs() < 1e-3);
    }

    #[test]
    fn yaw_about_vertical_is_still_zero() {
        // Turning in place doesn't tilt the up axis.
        let q = Quat::from_rotation_y(120.0_f32.to_radians());
        assert!(bend_angle(q).abs() < 1e-3);
    }

    #[test]
    fn non_finite_attitude_is_nan() {
        let q = Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0);
        assert!(bend_angle(q).is_nan());
    }
}
