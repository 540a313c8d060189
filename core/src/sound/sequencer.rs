use crate::feed_interface::WarningCode;
use crate::prelude::{CueConfig, WarnResult};
use crate::sound::sequence::{SequenceState, SoundSequence, SoundStep, SEQUENCE_LEN};
use crate::telemetry::log::LogManager;

/// Loads and plays clips on behalf of the sequencer.
///
/// `play` is fire-and-forget: it must return without waiting for the clip.
pub trait AudioBackend {
    type Clip: Clone;

    /// Fails with `AssetMissing` when no clip exists under `name`.
    fn load(&mut self, name: &str) -> WarnResult<Self::Clip>;
    fn duration_secs(&self, clip: &Self::Clip) -> f64;
    fn play(&mut self, clip: &Self::Clip) -> WarnResult<()>;
}

/// Plays the start / warning / end cue for newly active warnings.
///
/// At most one sequence is in flight; `start` replaces it outright.
pub struct NotificationSoundSequencer<B: AudioBackend> {
    backend: B,
    cues: CueConfig,
    sequence: Option<SoundSequence<B::Clip>>,
    state: SequenceState,
    started_at: f64,
    logger: LogManager,
}

impl<B: AudioBackend> NotificationSoundSequencer<B> {
    pub fn new(backend: B, cues: CueConfig) -> Self {
        Self {
            backend,
            cues,
            sequence: None,
            state: SequenceState::Idle,
            started_at: 0.0,
            logger: LogManager::new("warncore::sound"),
        }
    }

    /// Begins the sequence for `code`. Returns false, leaving the current
    /// state untouched, when the clips cannot be assembled.
    pub fn start(&mut self, code: WarningCode, now: f64) -> bool {
        let sequence = match self.build(code) {
            Ok(sequence) => sequence,
            Err(err) => {
                self.logger
                    .warn(&format!("no sound sequence for {}: {}", code, err));
                return false;
            }
        };

        if let (SequenceState::Playing(step), Some(current)) = (self.state, &self.sequence) {
            self.logger.record(&format!(
                "{} preempts {} at step {}",
                code,
                current.code(),
                step
            ));
        }

        self.sequence = Some(sequence);
        self.state = SequenceState::Playing(0);
        self.started_at = now;
        self.play_step(0);
        true
    }

    /// Moves to the next step once the cumulative duration so far has passed.
    pub fn update(&mut self, now: f64) {
        let SequenceState::Playing(step) = self.state else {
            return;
        };
        let Some(sequence) = self.sequence.as_ref() else {
            self.state = SequenceState::Idle;
            return;
        };

        if now - self.started_at > sequence.cumulative_secs(step) {
            let next = step + 1;
            if next < SEQUENCE_LEN {
                self.state = SequenceState::Playing(next);
                self.play_step(next);
            } else {
                self.logger
                    .record(&format!("sound sequence for {} finished", sequence.code()));
                self.state = SequenceState::Done;
            }
        }
    }

    fn build(&mut self, code: WarningCode) -> WarnResult<SoundSequence<B::Clip>> {
        let warning = match self.step(code.asset_stem()) {
            Ok(step) => step,
            Err(err) => {
                self.logger.warn(&format!(
                    "{}, using {}",
                    err, self.cues.placeholder_clip
                ));
                let placeholder = self.cues.placeholder_clip.clone();
                self.step(&placeholder)?
            }
        };
        let start_clip = self.cues.start_clip.clone();
        let end_clip = self.cues.end_clip.clone();
        let start = self.step(&start_clip)?;
        let end = self.step(&end_clip)?;
        Ok(SoundSequence::new(code, start, warning, end))
    }

    fn step(&mut self, name: &str) -> WarnResult<SoundStep<B::Clip>> {
        let clip = self.backend.load(name)?;
        let duration_secs = self.backend.duration_secs(&clip);
        Ok(SoundStep {
            name: name.to_string(),
            clip,
            duration_secs,
        })
    }

    fn play_step(&mut self, index: usize) {
        let Some(step) = self.sequence.as_ref().and_then(|sequence| sequence.step(index)) else {
            return;
        };
        self.logger.record(&format!(
            "playing step {} ({}, {:.2}s)",
            index, step.name, step.duration_secs
        ));
        if let Err(err) = self.backend.play(&step.clip) {
            self.logger.warn(&format!("playback of {} failed: {}", step.name, err));
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// Warning whose sequence is current, if any was ever started.
    pub fn current_code(&self) -> Option<WarningCode> {
        self.sequence.as_ref().map(SoundSequence::code)
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::WarnError;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeAudio {
        clips: HashMap<String, f64>,
        played: Vec<String>,
    }

    impl FakeAudio {
        fn with(clips: &[(&str, f64)]) -> Self {
            Self {
                clips: clips
                    .iter()
                    .map(|(name, secs)| (name.to_string(), *secs))
                    .collect(),
                played: Vec::new(),
            }
        }
    }

    impl AudioBackend for FakeAudio {
        type Clip = (String, f64);

        fn load(&mut self, name: &str) -> WarnResult<Self::Clip> {
            self.clips
                .get(name)
                .map(|secs| (name.to_string(), *secs))
                .ok_or_else(|| WarnError::AssetMissing(format!("{name}.mp3")))
        }

        fn duration_secs(&self, clip: &Self::Clip) -> f64 {
            clip.1
        }

        fn play(&mut self, clip: &Self::Clip) -> WarnResult<()> {
            self.played.push(clip.0.clone());
            Ok(())
        }
    }

    fn sequencer(clips: &[(&str, f64)]) -> NotificationSoundSequencer<FakeAudio> {
        NotificationSoundSequencer::new(FakeAudio::with(clips), CueConfig::default())
    }

    #[test]
    fn steps_advance_on_cumulative_duration() {
        let mut player = sequencer(&[("start", 1.0), ("tc8ne", 3.0), ("end", 0.8)]);
        assert!(player.start(WarningCode::Signal8NorthEast, 0.0));
        assert_eq!(player.state(), SequenceState::Playing(0));

        player.update(0.5);
        assert_eq!(player.state(), SequenceState::Playing(0));
        player.update(1.2);
        assert_eq!(player.state(), SequenceState::Playing(1));
        player.update(4.3);
        assert_eq!(player.state(), SequenceState::Playing(2));
        player.update(5.2);
        assert_eq!(player.state(), SequenceState::Done);

        player.update(9.0);
        player.update(60.0);
        assert_eq!(player.state(), SequenceState::Done);
        assert_eq!(player.backend().played, vec!["start", "tc8ne", "end"]);
    }

    #[test]
    fn steps_wait_until_duration_is_exceeded() {
        let mut player = sequencer(&[("start", 1.0), ("ts", 1.0), ("end", 1.0)]);
        player.start(WarningCode::Thunderstorm, 10.0);
        player.update(11.0);
        assert_eq!(player.state(), SequenceState::Playing(0));
        player.update(11.01);
        assert_eq!(player.state(), SequenceState::Playing(1));
    }

    #[test]
    fn new_start_preempts_running_sequence() {
        let mut player = sequencer(&[
            ("start", 1.0),
            ("rainr", 3.0),
            ("rainb", 2.0),
            ("end", 0.8),
        ]);
        player.start(WarningCode::RedRain, 0.0);
        player.update(1.5);
        assert_eq!(player.state(), SequenceState::Playing(1));

        assert!(player.start(WarningCode::BlackRain, 2.0));
        assert_eq!(player.state(), SequenceState::Playing(0));
        assert_eq!(player.current_code(), Some(WarningCode::BlackRain));
        assert_eq!(player.started_at(), 2.0);

        player.update(3.5);
        assert_eq!(player.state(), SequenceState::Playing(1));
        assert_eq!(
            player.backend().played,
            vec!["start", "rainr", "start", "rainb"]
        );
    }

    #[test]
    fn missing_warning_clip_uses_placeholder() {
        let mut player = sequencer(&[("start", 0.5), ("place_holder", 2.0), ("end", 0.5)]);
        assert!(player.start(WarningCode::Tsunami, 0.0));
        player.update(0.6);
        assert_eq!(player.backend().played, vec!["start", "place_holder"]);
    }

    #[test]
    fn aborts_without_placeholder_and_stays_idle() {
        let mut player = sequencer(&[("start", 0.5), ("end", 0.5)]);
        assert!(!player.start(WarningCode::Frost, 0.0));
        assert_eq!(player.state(), SequenceState::Idle);
        assert!(player.backend().played.is_empty());
    }

    #[test]
    fn failed_start_keeps_running_sequence() {
        let mut player = sequencer(&[("start", 1.0), ("cold", 1.0), ("end", 1.0)]);
        player.start(WarningCode::Cold, 0.0);
        assert!(!player.start(WarningCode::Frost, 0.5));
        assert_eq!(player.current_code(), Some(WarningCode::Cold));
        assert_eq!(player.state(), SequenceState::Playing(0));
    }

    #[test]
    fn missing_cue_aborts_the_sequence() {
        let mut player = sequencer(&[("start", 1.0), ("vhot", 1.0)]);
        assert!(!player.start(WarningCode::VeryHot, 0.0));
        assert_eq!(player.current_code(), None);
    }
}
