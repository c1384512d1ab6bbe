use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline tick rate (Hz). One tick = one full pass through
    /// calibration, smoothing, angle extraction, and the state machine.
    pub tick_rate_hz: f32,
    /// IMU source configuration.
    pub imu: ImuConfig,
    /// Attitude smoothing.
    pub smoothing: SmoothingConfig,
    /// Rep state machine thresholds.
    pub analysis: AnalysisConfig,
    /// Feedback output.
    pub feedback: FeedbackConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            imu: ImuConfig::default(),
            smoothing: SmoothingConfig::default(),
            analysis: AnalysisConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImuConfig {
    /// Phone sensor-stream endpoint, `host:port`.
    /// `None` runs the scripted motion simulator instead.
    pub address: Option<String>,
    /// Expected sample rate of the stream (Hz).
    pub sample_rate_hz: f32,
    /// Madgwick convergence gain for raw-frame streams.
    /// Higher = more responsive, less smooth.
    pub fusion_beta: f32,
    /// Stationary samples averaged for gyro bias calibration.
    pub bias_samples: u32,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            address: None,
            sample_rate_hz: 60.0,
            fusion_beta: 0.1,
            bias_samples: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Exponential smoothing rate (1/s). Higher tracks faster.
    pub responsiveness: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { responsiveness: 8.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Bend angle (deg) that starts a descent.
    pub enter_threshold_deg: f32,
    /// Bend angle (deg) that counts as the bottom of the squat.
    pub bottom_threshold_deg: f32,
    /// Bend angle (deg) that counts as upright.
    pub standing_threshold_deg: f32,
    /// Descents faster than this (seconds) draw a coaching warning.
    pub min_descent_secs: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enter_threshold_deg: 30.0,
            bottom_threshold_deg: 75.0,
            standing_threshold_deg: 20.0,
            min_descent_secs: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Whether to run the pulse pattern scheduler.
    pub haptics: bool,
    /// Player profile name used for session history.
    pub profile_name: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            haptics: true,
            profile_name: "default".to_string(),
        }
    }
}
