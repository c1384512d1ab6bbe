use std::fmt;
use std::time::Duration;

/// Quality annotation attached to a completed rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepQuality {
    Good,
    /// The descent was faster than the coaching minimum.
    TooFast,
}

/// Emitted once per Ascending→Standing transition.
#[derive(Debug, Clone, Copy)]
pub struct RepEvent {
    /// Total reps this session, including this one.
    pub count: u32,
    pub quality: RepQuality,
    /// How long the descent phase took.
    pub descent: Duration,
}

/// Reasons a rep attracts a coaching warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadFormReason {
    TooFast,
}

impl fmt::Display for BadFormReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadFormReason::TooFast => write!(f, "Too Fast"),
        }
    }
}

/// Emitted at most once per transition that violates form.
#[derive(Debug, Clone, Copy)]
pub struct BadFormEvent {
    pub reason: BadFormReason,
    /// Measured descent duration that tripped the warning.
    pub descent: Duration,
}

/// Discrete output of the rep state machine, consumed by feedback listeners.
/// Not retained by the analyzer.
#[derive(Debug, Clone, Copy)]
pub enum AnalysisEvent {
    Rep(RepEvent),
    BadForm(BadFormEvent),
}
