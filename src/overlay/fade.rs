use std::time::{Duration, Instant};

/// Fade-in parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeConfig {
    pub duration: Duration,
    pub steps: u32,
}

impl FadeConfig {
    pub fn new(duration: Duration, steps: u32) -> Self {
        Self { duration, steps }
    }

    /// A fade needs a positive duration and at least two steps.
    pub fn is_enabled(&self) -> bool {
        !self.duration.is_zero() && self.steps > 1
    }

    /// Delay between consecutive steps, never shorter than a millisecond.
    pub fn step_interval(&self) -> Duration {
        if self.steps == 0 {
            return self.duration;
        }
        let ms = self.duration.as_millis() as u64 / self.steps as u64;
        Duration::from_millis(ms.max(1))
    }
}

/// An in-flight opacity ramp. Advanced one step at a time by the overlay
/// loop; dropping it cancels the remaining steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeAnimation {
    pub step_index: u32,
    pub target_steps: u32,
    pub interval: Duration,
    pub next_due: Instant,
}

impl FadeAnimation {
    /// Start a ramp whose first step is due one interval after `now`.
    pub fn start(config: FadeConfig, now: Instant) -> Self {
        let interval = config.step_interval();
        Self {
            step_index: 0,
            target_steps: config.steps,
            interval,
            next_due: now + interval,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    /// Opacity applied by the current step.
    pub fn current_opacity(&self) -> f32 {
        (self.step_index + 1) as f32 / self.target_steps as f32
    }

    /// Move past the current step. Returns `false` once every step has run.
    pub fn advance(&mut self, now: Instant) -> bool {
        self.step_index += 1;
        if self.step_index >= self.target_steps {
            return false;
        }
        self.next_due = now + self.interval;
        true
    }
}
