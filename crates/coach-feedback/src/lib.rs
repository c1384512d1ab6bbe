//! Feedback event interface: listener registration and per-tick dispatch.
//!
//! The analyzer returns events; the host pushes them here and drains the
//! queue exactly once per tick, so every listener sees every event exactly
//! once per transition. No ambient singletons, no observer wiring into the
//! state machine.

pub mod pattern;

pub use pattern::{LogPulseSink, PatternScheduler, PulsePattern, PulseSink, PulseStep};

use coach_analysis::{AnalysisEvent, BadFormEvent, RepEvent};
use std::collections::VecDeque;

/// Receives coaching events. Implementations drive audio, haptics, UI, or
/// logging — the dispatcher doesn't care.
pub trait FeedbackListener {
    fn on_rep(&mut self, event: &RepEvent);
    fn on_bad_form(&mut self, event: &BadFormEvent);
}

/// Queue-and-drain event dispatcher.
pub struct FeedbackDispatcher {
    listeners: Vec<Box<dyn FeedbackListener>>,
    queue: VecDeque<AnalysisEvent>,
}

impl FeedbackDispatcher {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            queue: VecDeque::new(),
        }
    }

    pub fn register(&mut self, listener: Box<dyn FeedbackListener>) {
        self.listeners.push(listener);
    }

    /// Enqueue an event for the next drain.
    pub fn push(&mut self, event: AnalysisEvent) {
        self.queue.push_back(event);
    }

    /// Deliver every queued event to every listener, in arrival order.
    /// Call once per tick.
    pub fn drain(&mut self) {
        while let Some(event) = self.queue.pop_front() {
            for listener in &mut self.listeners {
                match &event {
                    AnalysisEvent::Rep(rep) => listener.on_rep(rep),
                    AnalysisEvent::BadForm(bad) => listener.on_bad_form(bad),
                }
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Default for FeedbackDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs coaching events; the stand-in for audio/visual output on a headless
/// host.
pub struct ConsoleFeedback;

impl FeedbackListener for ConsoleFeedback {
    fn on_rep(&mut self, event: &RepEvent) {
        tracing::info!(
            count = event.count,
            quality = ?event.quality,
            descent_s = event.descent.as_secs_f32(),
            "Rep complete"
        );
    }

    fn on_bad_form(&mut self, event: &BadFormEvent) {
        tracing::warn!(
            reason = %event.reason,
            descent_s = event.descent.as_secs_f32(),
            "Bad form"
        );
    }
}
