//! Squat classification: bend-angle extraction and the rep state machine.
//!
//! Consumes calibrated, smoothed attitudes one tick at a time and emits
//! discrete coaching events (rep completed, bad form). Pure logic; no I/O,
//! no engine, no callbacks.

pub mod analyzer;
pub mod angle;
pub mod events;

pub use analyzer::{AnalyzerConfig, ExerciseState, RepAnalyzer, BOTTOM_EXIT_MARGIN};
pub use angle::bend_angle;
pub use events::{AnalysisEvent, BadFormEvent, BadFormReason, RepEvent, RepQuality};
