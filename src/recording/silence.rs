use std::time::Duration;

/// Energy at or below this level counts as silence
pub const SILENCE_THRESHOLD: f32 = 0.01;

/// How long silence must last before recording stops on its own
pub const SILENCE_DURATION: Duration = Duration::from_millis(1500);

/// What to do with the silence timer after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceAction {
    /// Silent frame with no timer pending: start the countdown
    Arm,
    /// Active frame while a countdown is pending: cancel it
    Disarm,
    /// Nothing changes
    Keep,
}

/// Debounces pauses: only an uninterrupted run of silent frames ends a recording
#[derive(Debug, Clone, Copy)]
pub struct SilencePolicy {
    threshold: f32,
}

impl SilencePolicy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_active(&self, energy: f32) -> bool {
        energy > self.threshold
    }

    /// Decide the timer action for one frame's energy reading
    pub fn observe(&self, energy: f32, timer_armed: bool) -> SilenceAction {
        match (self.is_active(energy), timer_armed) {
            (true, true) => SilenceAction::Disarm,
            (false, false) => SilenceAction::Arm,
            _ => SilenceAction::Keep,
        }
    }
}

impl Default for SilencePolicy {
    fn default() -> Self {
        Self::new(SILENCE_THRESHOLD)
    }
}
