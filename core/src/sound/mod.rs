pub mod sequence;
pub mod sequencer;

pub use sequence::{SequenceState, SoundSequence, SoundStep, SEQUENCE_LEN};
pub use sequencer::{AudioBackend, NotificationSoundSequencer};
