use coach_analysis::{bend_angle, AnalysisEvent, AnalyzerConfig, ExerciseState, RepAnalyzer};
use coach_imu::{CalibrationFilter, MotionSmoother, OrientationSample};
use std::time::Duration;

/// The per-tick motion classification pipeline:
/// raw attitude → calibration → smoothing → bend angle → rep state machine.
///
/// Owns every stage explicitly — no singletons, no ambient lookups. The host
/// constructs one of these, feeds it the newest sample each tick, and routes
/// the returned events to the feedback dispatcher. Ticks without a fresh
/// sample are simply not fed in, which freezes the state machine in place.
pub struct CoachPipeline {
    calibration: CalibrationFilter,
    smoother: MotionSmoother,
    analyzer: RepAnalyzer,
    last_tick: Option<Duration>,
    smoothed_angle: f32,
}

impl CoachPipeline {
    pub fn new(analyzer_config: AnalyzerConfig, smoothing_responsiveness: f32) -> Self {
        Self {
            calibration: CalibrationFilter::new(),
            smoother: MotionSmoother::new(smoothing_responsiveness),
            analyzer: RepAnalyzer::new(analyzer_config),
            last_tick: None,
            smoothed_angle: 0.0,
        }
    }

    /// Run one sample through every stage. Returns the events this tick
    /// produced (at most one transition's worth).
    pub fn tick(&mut self, sample: &OrientationSample, now: Duration) -> Vec<AnalysisEvent> {
        if !sample.is_finite() {
            // Degenerate input never reaches stored state (calibration,
            // smoother, or state machine); the tick is skipped.
            tracing::trace!(seq = sample.seq, "Skipping non-finite sample");
            return Vec::new();
        }

        let dt = match self.last_tick {
            Some(last) => now.saturating_sub(last),
            None => Duration::ZERO,
        };
        self.last_tick = Some(now);

        let corrected = self.calibration.corrected(sample.attitude);
        let smoothed = self.smoother.smooth_rotation(corrected, dt);
        let angle = bend_angle(smoothed);
        self.smoothed_angle = angle;

        self.analyzer.process(angle, now)
    }

    /// Capture the sample's raw attitude as the zero pose.
    ///
    /// The smoother restarts so the next tick doesn't blend across the
    /// reference change.
    pub fn calibrate(&mut self, sample: &OrientationSample) {
        if !sample.is_finite() {
            tracing::warn!("Ignoring calibration on non-finite sample");
            return;
        }
        self.calibration.calibrate(sample.attitude);
        self.smoother.reset();
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    pub fn state(&self) -> ExerciseState {
        self.analyzer.state()
    }

    pub fn rep_count(&self) -> u32 {
        self.analyzer.rep_count()
    }

    /// Bend angle after calibration and smoothing, degrees.
    pub fn current_angle(&self) -> f32 {
        self.smoothed_angle
    }

    pub fn last_message(&self) -> Option<&str> {
        self.analyzer.last_message()
    }

    /// Reset the rep counter and state machine for a new set; calibration
    /// is kept.
    pub fn reset_session(&mut self) {
        self.analyzer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coach_analysis::RepQuality;
    use glam::{Quat, Vec3};

    fn sample(attitude: Quat, seq: u64, t: f32) -> OrientationSample {
        OrientationSample {
            attitude,
            accel: Vec3::ZERO,
            seq,
            elapsed: Duration::from_secs_f32(t),
        }
    }

    fn lean(deg: f32) -> Quat {
        Quat::from_rotation_x(deg.to_radians())
    }

    /// Very responsive smoothing so staged angle sequences pass through
    /// nearly unchanged.
    fn pipeline() -> CoachPipeline {
        CoachPipeline::new(AnalyzerConfig::default(), 1000.0)
    }

    fn feed_ramp(pipeline: &mut CoachPipeline, ramp: &[(f32, f32)]) -> Vec<AnalysisEvent> {
        let mut events = Vec::new();
        for (i, &(deg, t)) in ramp.iter().enumerate() {
            let s = sample(lean(deg), i as u64 + 1, t);
            events.extend(pipeline.tick(&s, Duration::from_secs_f32(t)));
        }
        events
    }

    #[test]
    fn full_squat_counts_one_rep_end_to_end() {
        let mut pipeline = pipeline();
        let events = feed_ramp(
            &mut pipeline,
            &[
                (0.0, 0.0),
                (10.0, 0.3),
                (40.0, 0.8),
                (85.0, 2.2),
                (85.0, 2.5),
                (50.0, 3.0),
                (5.0, 3.6),
            ],
        );

        assert_eq!(pipeline.rep_count(), 1);
        assert_eq!(pipeline.state(), ExerciseState::Standing);
        assert!(events
            .iter()
            .any(|e| matches!(e, AnalysisEvent::Rep(r) if r.quality == RepQuality::Good)));
    }

    #[test]
    fn mount_bias_is_removed_by_calibration() {
        // Phone strapped on 25 degrees crooked: uncalibrated, standing
        // already reads close to the enter threshold.
        let bias = lean(25.0);
        let mut pipeline = pipeline();
        pipeline.calibrate(&sample(bias, 1, 0.0));
        assert!(pipeline.is_calibrated());

        // Standing with the biased mount reads ~0 after correction.
        pipeline.tick(&sample(bias, 2, 0.1), Duration::from_millis(100));
        assert!(pipeline.current_angle() < 1.0);
        assert_eq!(pipeline.state(), ExerciseState::Standing);

        // A full squat on top of the bias still counts.
        for (i, (deg, t)) in [(40.0, 0.5), (85.0, 2.0), (50.0, 2.5), (5.0, 3.0)]
            .iter()
            .enumerate()
        {
            let s = sample(bias * lean(*deg), i as u64 + 3, *t);
            pipeline.tick(&s, Duration::from_secs_f32(*t));
        }
        assert_eq!(pipeline.rep_count(), 1);
    }

    #[test]
    fn non_finite_sample_freezes_everything() {
        let mut pipeline = pipeline();
        pipeline.tick(&sample(lean(45.0), 1, 0.5), Duration::from_secs_f32(0.5));
        assert_eq!(pipeline.state(), ExerciseState::Descending);
        let angle_before = pipeline.current_angle();

        let bad = sample(Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0), 2, 0.6);
        let events = pipeline.tick(&bad, Duration::from_secs_f32(0.6));

        assert!(events.is_empty());
        assert_eq!(pipeline.state(), ExerciseState::Descending);
        assert_eq!(pipeline.current_angle(), angle_before);
    }

    #[test]
    fn heavy_smoothing_suppresses_single_sample_jitter() {
        // Sluggish smoother: one wild sample cannot jump the angle far.
        let mut pipeline = CoachPipeline::new(AnalyzerConfig::default(), 2.0);
        let tick = Duration::from_millis(16);

        let mut now = Duration::ZERO;
        for i in 0..10 {
            pipeline.tick(&sample(lean(0.0), i, now.as_secs_f32()), now);
            now += tick;
        }
        // A single 80-degree glitch.
        pipeline.tick(&sample(lean(80.0), 11, now.as_secs_f32()), now);

        assert!(pipeline.current_angle() < 5.0);
        assert_eq!(pipeline.state(), ExerciseState::Standing);
    }

    #[test]
    fn reset_session_keeps_calibration() {
        let bias = lean(25.0);
        let mut pipeline = pipeline();
        pipeline.calibrate(&sample(bias, 1, 0.0));
        feed_ramp(&mut pipeline, &[(0.0, 0.1)]);

        pipeline.reset_session();
        assert_eq!(pipeline.rep_count(), 0);
        assert!(pipeline.is_calibrated());
    }
}
