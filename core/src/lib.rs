//! Warning state tracking and media scheduling for the weather warning board.
//!
//! The modules split the per-tick work into a feed interface, the warning
//! history tracker, icon animation and notification sound sequencing. Nothing
//! in here performs I/O: feed fetching, asset decoding and playback are left to
//! the driver through the `IconSource` and `AudioBackend` traits.

pub mod animation;
pub mod feed_interface;
pub mod prelude;
pub mod sound;
pub mod telemetry;
pub mod tracking;

pub use animation::{AnimatorRegistry, FrameSet, IconAnimator, IconSource, ToggleClock};
pub use feed_interface::{FeedRecord, WarningCode};
pub use prelude::{CueConfig, WarnError, WarnResult};
pub use sound::{AudioBackend, NotificationSoundSequencer, SequenceState};
pub use tracking::{Evaluation, FeedInput, Freshness, WarningStateTracker};
