use crate::feed_interface::WarningCode;
use serde::{Deserialize, Serialize};

/// Steps in every notification: start cue, warning clip, end cue.
pub const SEQUENCE_LEN: usize = 3;

#[derive(Debug, Clone)]
pub struct SoundStep<C> {
    pub name: String,
    pub clip: C,
    pub duration_secs: f64,
}

/// Fixed three-step notification cue for one warning.
#[derive(Debug, Clone)]
pub struct SoundSequence<C> {
    code: WarningCode,
    steps: [SoundStep<C>; SEQUENCE_LEN],
}

impl<C> SoundSequence<C> {
    pub fn new(
        code: WarningCode,
        start: SoundStep<C>,
        warning: SoundStep<C>,
        end: SoundStep<C>,
    ) -> Self {
        Self {
            code,
            steps: [start, warning, end],
        }
    }

    pub fn code(&self) -> WarningCode {
        self.code
    }

    pub fn steps(&self) -> &[SoundStep<C>] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&SoundStep<C>> {
        self.steps.get(index)
    }

    /// Time from the start of the sequence until step `index` has finished.
    pub fn cumulative_secs(&self, index: usize) -> f64 {
        self.steps
            .iter()
            .take(index + 1)
            .map(|step| step.duration_secs)
            .sum()
    }

    pub fn total_secs(&self) -> f64 {
        self.cumulative_secs(SEQUENCE_LEN - 1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum SequenceState {
    #[default]
    Idle,
    Playing(usize),
    Done,
}
