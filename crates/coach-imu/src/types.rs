use glam::{Quat, Vec3};
use std::time::Duration;

/// Raw inertial reading decoded from the phone stream.
#[derive(Debug, Clone, Copy)]
pub struct RawImuSample {
    /// Gyroscope angular velocity (rad/s).
    pub gyro: Vec3,
    /// Accelerometer linear acceleration (m/s^2).
    pub accel: Vec3,
}

/// One orientation sample published by the IMU client.
///
/// Immutable once published; consumers read the latest value each tick.
#[derive(Debug, Clone, Copy)]
pub struct OrientationSample {
    /// Device attitude as a unit quaternion.
    pub attitude: Quat,
    /// Linear acceleration (m/s^2), gravity removed by the phone.
    pub accel: Vec3,
    /// Monotonically increasing sample number.
    pub seq: u64,
    /// Time since the client started.
    pub elapsed: Duration,
}

impl OrientationSample {
    /// Whether every component is a finite number.
    ///
    /// Corrupt stream data must never reach the calibration filter or the
    /// rep state machine; callers skip the tick when this is false.
    pub fn is_finite(&self) -> bool {
        self.attitude.is_finite() && self.accel.is_finite()
    }
}

impl Default for OrientationSample {
    fn default() -> Self {
        Self {
            attitude: Quat::IDENTITY,
            accel: Vec3::ZERO,
            seq: 0,
            elapsed: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sample_is_identity() {
        let sample = OrientationSample::default();
        assert_eq!(sample.attitude, Quat::IDENTITY);
        assert!(sample.is_finite());
    }

    #[test]
    fn nan_attitude_is_not_finite() {
        let sample = OrientationSample {
            attitude: Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0),
            ..Default::default()
        };
        assert!(!sample.is_finite());
    }

    #[test]
    fn nan_accel_is_not_finite() {
        let sample = OrientationSample {
            accel: Vec3::new(0.0, f32::NAN, 0.0),
            ..Default::default()
        };
        assert!(!sample.is_finite());
    }
}
