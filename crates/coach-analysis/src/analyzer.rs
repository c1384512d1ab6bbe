use crate::events::{AnalysisEvent, BadFormEvent, BadFormReason, RepEvent, RepQuality};
use std::fmt;
use std::time::Duration;

/// Hysteresis gap between entering and leaving the bottom of a squat, in
/// degrees. A fixed anti-jitter margin, deliberately not configurable.
pub const BOTTOM_EXIT_MARGIN: f32 = 10.0;

/// Thresholds for the squat rep state machine (degrees, strict comparisons).
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    /// Leaving Standing once the bend angle exceeds this.
    pub enter_threshold: f32,
    /// Reaching the bottom of the squat.
    pub bottom_threshold: f32,
    /// Counting as upright again.
    pub standing_threshold: f32,
    /// Descents faster than this draw a "too fast" warning.
    pub min_descent_time: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            enter_threshold: 30.0,
            bottom_threshold: 75.0,
            standing_threshold: 20.0,
            min_descent_time: Duration::from_secs(1),
        }
    }
}

/// Phase of the current squat cycle.
///
/// Transitions are monotone per cycle (Standing → Descending → AtBottom →
/// Ascending → Standing), except the early-abort edge from Descending
/// straight back to Standing when the user bails out of a rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseState {
    Standing,
    Descending,
    AtBottom,
    Ascending,
}

impl fmt::Display for ExerciseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExerciseState::Standing => "Standing",
            ExerciseState::Descending => "Descending",
            ExerciseState::AtBottom => "AtBottom",
            ExerciseState::Ascending => "Ascending",
        };
        write!(f, "{label}")
    }
}

/// Squat repetition counter driven by the scalar bend-angle stream.
///
/// Call `process` once per tick with the current angle and wall-clock time.
/// Events come back as return values; nothing is delivered through
/// callbacks, the host decides where they go.
pub struct RepAnalyzer {
    config: AnalyzerConfig,
    state: ExerciseState,
    /// When the current state was entered.
    state_entered: Duration,
    rep_count: u32,
    current_angle: f32,
    /// Duration of the most recent completed descent.
    last_descent: Duration,
    /// Whether that descent tripped the speed warning.
    descent_too_fast: bool,
    last_message: Option<String>,
}

impl RepAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            state: ExerciseState::Standing,
            state_entered: Duration::ZERO,
            rep_count: 0,
            current_angle: 0.0,
            last_descent: Duration::ZERO,
            descent_too_fast: false,
            last_message: None,
        }
    }

    /// Consume one bend-angle sample.
    ///
    /// Non-finite angles freeze the machine: state, stored angle, and the
    /// phase timer all keep their previous values and no events are emitted.
    pub fn process(&mut self, angle: f32, now: Duration) -> Vec<AnalysisEvent> {
        if !angle.is_finite() {
            tracing::trace!(state = %self.state, "Holding state on non-finite angle");
            return Vec::new();
        }

        self.current_angle = angle;
        let mut events = Vec::new();

        match self.state {
            ExerciseState::Standing => {
                if angle > self.config.enter_threshold {
                    self.change_state(ExerciseState::Descending, now);
                }
            }

            ExerciseState::Descending => {
                if angle > self.config.bottom_threshold {
                    let descent = now.saturating_sub(self.state_entered);
                    self.last_descent = descent;
                    self.descent_too_fast = descent < self.config.min_descent_time;

                    if self.descent_too_fast {
                        self.last_message =
                            Some(format!("TOO FAST! ({:.1}s)", descent.as_secs_f32()));
                        tracing::warn!(descent_s = descent.as_secs_f32(), "Descent too fast");
                        events.push(AnalysisEvent::BadForm(BadFormEvent {
                            reason: BadFormReason::TooFast,
                            descent,
                        }));
                    } else {
                        self.last_message = None;
                    }

                    self.change_state(ExerciseState::AtBottom, now);
                } else if angle < self.config.standing_threshold {
                    // Bailed out without reaching the bottom.
                    self.change_state(ExerciseState::Standing, now);
                }
            }

            ExerciseState::AtBottom => {
                if angle < self.config.bottom_threshold - BOTTOM_EXIT_MARGIN {
                    self.change_state(ExerciseState::Ascending, now);
                }
            }

            ExerciseState::Ascending => {
                if angle < self.config.standing_threshold {
                    self.rep_count += 1;
                    let quality = if self.descent_too_fast {
                        RepQuality::TooFast
                    } else {
                        RepQuality::Good
                    };
                    self.last_message = Some("Good Rep!".to_string());
                    tracing::info!(reps = self.rep_count, "Rep completed");
                    events.push(AnalysisEvent::Rep(RepEvent {
                        count: self.rep_count,
                        quality,
                        descent: self.last_descent,
                    }));
                    self.change_state(ExerciseState::Standing, now);
                }
            }
        }

        events
    }

    fn change_state(&mut self, next: ExerciseState, now: Duration) {
        tracing::debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
        // Phase timer restarts on every transition.
        self.state_entered = now;
    }

    pub fn state(&self) -> ExerciseState {
        self.state
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// Last accepted bend angle, degrees.
    pub fn current_angle(&self) -> f32 {
        self.current_angle
    }

    /// Last coaching message ("Good Rep!" or a warning), if any.
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Start a fresh session: counter and state reset, config kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}
