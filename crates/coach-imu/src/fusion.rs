use crate::types::RawImuSample;
use ahrs::{Ahrs, Madgwick};
use glam::{Quat, Vec3};
use nalgebra::Vector3;

/// Madgwick sensor fusion for phones that stream raw gyro + accel.
///
/// Collects a stationary window first to estimate gyro bias, then feeds
/// bias-corrected readings to the AHRS filter. Phones that stream fused
/// attitude frames bypass this entirely.
///
/// Note: the zero-pose reference does NOT live here — that is the
/// `CalibrationFilter`'s job, owned by the host.
pub struct SensorFusion {
    filter: Madgwick<f64>,
    gyro_bias: Vec3,
    bias: BiasState,
}

enum BiasState {
    Collecting { sum: Vec3, count: u32, target: u32 },
    Ready,
}

impl SensorFusion {
    /// `beta` is the Madgwick convergence gain; `bias_samples` the number of
    /// stationary samples averaged for gyro bias.
    pub fn new(beta: f32, bias_samples: u32, sample_rate_hz: f32) -> Self {
        let sample_dt = 1.0 / sample_rate_hz.max(1.0) as f64;
        Self {
            filter: Madgwick::new(sample_dt, beta as f64),
            gyro_bias: Vec3::ZERO,
            bias: BiasState::Collecting {
                sum: Vec3::ZERO,
                count: 0,
                target: bias_samples.max(1),
            },
        }
    }

    /// Process a raw sample. Returns the fused attitude once bias
    /// calibration has finished, `None` while still collecting or when the
    /// filter rejects the sample (e.g. free-fall, zero accel).
    pub fn update(&mut self, sample: &RawImuSample) -> Option<Quat> {
        match &mut self.bias {
            BiasState::Collecting { sum, count, target } => {
                *sum += sample.gyro;
                *count += 1;
                if *count >= *target {
                    self.gyro_bias = *sum / *count as f32;
                    self.bias = BiasState::Ready;
                    tracing::info!(
                        bias_x = self.gyro_bias.x,
                        bias_y = self.gyro_bias.y,
                        bias_z = self.gyro_bias.z,
                        "Gyro bias calibration complete"
                    );
                }
                None
            }
            BiasState::Ready => {
                let gyro = sample.gyro - self.gyro_bias;
                let gyro = Vector3::new(gyro.x as f64, gyro.y as f64, gyro.z as f64);
                let accel = Vector3::new(
                    sample.accel.x as f64,
                    sample.accel.y as f64,
                    sample.accel.z as f64,
                );

                if self.filter.update_imu(&gyro, &accel).is_err() {
                    return None;
                }

                let q = self.filter.quat;
                Some(Quat::from_xyzw(
                    q.coords[0] as f32,
                    q.coords[1] as f32,
                    q.coords[2] as f32,
                    q.coords[3] as f32,
                ))
            }
        }
    }

    /// Restart gyro bias collection (user must hold the phone still).
    pub fn restart_bias_calibration(&mut self, bias_samples: u32) {
        self.bias = BiasState::Collecting {
            sum: Vec3::ZERO,
            count: 0,
            target: bias_samples.max(1),
        };
        self.gyro_bias = Vec3::ZERO;
        tracing::info!(samples = bias_samples, "Gyro bias recalibration started");
    }

    /// Whether bias calibration has completed.
    pub fn is_ready(&self) -> bool {
        matches!(self.bias, BiasState::Ready)
    }
}
