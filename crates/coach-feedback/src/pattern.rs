use std::time::Duration;

/// One segment of a pulse pattern. Zero intensity is a rest.
#[derive(Debug, Clone, Copy)]
pub struct PulseStep {
    /// Normalized strength, 0.0–1.0.
    pub intensity: f32,
    pub duration: Duration,
}

/// A named sequence of pulses, the engine-free replacement for the original
/// coroutine-driven haptic patterns.
#[derive(Debug, Clone)]
pub struct PulsePattern {
    pub name: &'static str,
    pub steps: Vec<PulseStep>,
}

const fn step(intensity: f32, ms: u64) -> PulseStep {
    PulseStep {
        intensity,
        duration: Duration::from_millis(ms),
    }
}

impl PulsePattern {
    /// Double tap: rep counted.
    pub fn rep_complete() -> Self {
        Self {
            name: "rep_complete",
            steps: vec![step(0.6, 100), step(0.0, 100), step(0.6, 100)],
        }
    }

    /// Two long buzzes: form warning.
    pub fn bad_form() -> Self {
        Self {
            name: "bad_form",
            steps: vec![step(1.0, 250), step(0.0, 100), step(1.0, 250)],
        }
    }

    /// Rising triple: milestone reached.
    pub fn achievement() -> Self {
        Self {
            name: "achievement",
            steps: vec![
                step(0.5, 100),
                step(0.0, 100),
                step(0.7, 100),
                step(0.0, 100),
                step(1.0, 300),
            ],
        }
    }

    fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }
}

/// Receives pulse commands as pattern steps begin. A platform haptics
/// adapter would forward these to the vibration motor; the console sink
/// just logs them.
pub trait PulseSink {
    fn pulse(&mut self, intensity: f32);
}

/// Logs pulses instead of vibrating anything.
pub struct LogPulseSink;

impl PulseSink for LogPulseSink {
    fn pulse(&mut self, intensity: f32) {
        tracing::debug!(intensity, "Pulse");
    }
}

struct ActivePattern {
    pattern: PulsePattern,
    started: Duration,
    /// Index of the next step whose start has not yet been emitted.
    next_step: usize,
}

/// Advances pulse patterns once per tick — no coroutines, no timers owned
/// by an engine. `play` arms a pattern; `tick` emits the pulse for every
/// step whose start time has passed and retires finished patterns.
/// Patterns may overlap.
pub struct PatternScheduler {
    active: Vec<ActivePattern>,
}

impl PatternScheduler {
    pub fn new() -> Self {
        Self { active: Vec::new() }
    }

    pub fn play(&mut self, pattern: PulsePattern, now: Duration) {
        tracing::debug!(pattern = pattern.name, "Pattern armed");
        self.active.push(ActivePattern {
            pattern,
            started: now,
            next_step: 0,
        });
    }

    /// Emit due pulses and drop completed patterns.
    pub fn tick(&mut self, now: Duration, sink: &mut dyn PulseSink) {
        for active in &mut self.active {
            let elapsed = now.saturating_sub(active.started);

            // Fire every step whose start time has passed. A slow tick can
            // catch up on several steps at once; rests fire nothing.
            let mut step_start = active.pattern.steps[..active.next_step]
                .iter()
                .map(|s| s.duration)
                .sum::<Duration>();
            while active.next_step < active.pattern.steps.len() && step_start <= elapsed {
                let step = &active.pattern.steps[active.next_step];
                if step.intensity > 0.0 {
                    sink.pulse(step.intensity);
                }
                step_start += step.duration;
                active.next_step += 1;
            }
        }

        self.active.retain(|a| {
            let elapsed = now.saturating_sub(a.started);
            elapsed < a.pattern.total_duration()
        });
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }
}

impl Default for PatternScheduler {
    fn default() -> Self {
        Self::new()
    }
}
