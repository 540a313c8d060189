use crate::prelude::{WarnError, WarnResult};
use serde::{Deserialize, Serialize};

/// Nominal dwell of each frame in a bundled two-state icon.
pub const NOMINAL_TOGGLE_MS: u32 = 500;

/// Per-frame duration used when an animation carries no timing at all.
pub const FALLBACK_FRAME_MS: u32 = 100;

/// Scheduling policy that drives a frame set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePolicy {
    /// Two frames flipped in lockstep by the shared toggle clock.
    Toggle,
    /// Frames looped on absolute elapsed time using their own durations.
    Cycle,
}

/// Ordered frames with their display durations in milliseconds.
#[derive(Debug, Clone)]
pub struct FrameSet<F> {
    frames: Vec<F>,
    durations_ms: Vec<u32>,
    policy: FramePolicy,
}

impl<F> FrameSet<F> {
    pub fn toggle(first: F, second: F) -> Self {
        Self {
            frames: vec![first, second],
            durations_ms: vec![NOMINAL_TOGGLE_MS, NOMINAL_TOGGLE_MS],
            policy: FramePolicy::Toggle,
        }
    }

    /// Frames decoded from a multi-frame source keep their authored timing,
    /// whatever their count.
    pub fn cycle(frames: Vec<(F, u32)>) -> WarnResult<Self> {
        if frames.is_empty() {
            return Err(WarnError::InvalidFrames("no frames supplied".into()));
        }
        let (frames, durations_ms): (Vec<F>, Vec<u32>) = frames.into_iter().unzip();
        Ok(Self {
            frames,
            durations_ms,
            policy: FramePolicy::Cycle,
        })
    }

    /// Picks the policy from the number of frames: exactly two toggle.
    pub fn from_frames(frames: Vec<F>, durations_ms: Vec<u32>) -> WarnResult<Self> {
        if frames.len() != durations_ms.len() {
            return Err(WarnError::InvalidFrames(format!(
                "{} frames but {} durations",
                frames.len(),
                durations_ms.len()
            )));
        }
        if frames.len() == 2 {
            let mut frames = frames.into_iter();
            return match (frames.next(), frames.next()) {
                (Some(first), Some(second)) => Ok(Self::toggle(first, second)),
                _ => Err(WarnError::InvalidFrames("toggle set needs two frames".into())),
            };
        }
        Self::cycle(frames.into_iter().zip(durations_ms).collect())
    }

    /// Single blank frame shown when no asset could be loaded.
    pub fn placeholder(blank: F) -> Self {
        Self {
            frames: vec![blank],
            durations_ms: vec![FALLBACK_FRAME_MS],
            policy: FramePolicy::Cycle,
        }
    }

    pub fn policy(&self) -> FramePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[F] {
        &self.frames
    }

    pub fn durations_ms(&self) -> &[u32] {
        &self.durations_ms
    }

    pub fn frame(&self, index: usize) -> Option<&F> {
        self.frames.get(index)
    }

    /// Loop length, substituting the fallback duration when every frame is zero.
    pub fn total_duration_ms(&self) -> u64 {
        let total: u64 = self.durations_ms.iter().map(|&ms| u64::from(ms)).sum();
        if total == 0 {
            u64::from(FALLBACK_FRAME_MS) * self.durations_ms.len() as u64
        } else {
            total
        }
    }
}
