pub mod animator;
pub mod frames;
pub mod registry;
pub mod toggle;

pub use animator::{cycle_position_ms, select_frame, IconAnimator};
pub use frames::{FramePolicy, FrameSet, FALLBACK_FRAME_MS, NOMINAL_TOGGLE_MS};
pub use registry::{AnimatorRegistry, DisplayedFrame, IconSource};
pub use toggle::{ToggleClock, TOGGLE_DWELL_SECS};
