use serde::{Deserialize, Serialize};

/// Clip names used to assemble every notification sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueConfig {
    pub start_clip: String,
    pub end_clip: String,
    /// Played in place of a warning clip that has no asset of its own.
    pub placeholder_clip: String,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            start_clip: "start".into(),
            end_clip: "end".into(),
            placeholder_clip: "place_holder".into(),
        }
    }
}

/// Common error type for the warning core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WarnError {
    #[error("malformed feed snapshot: {0}")]
    FeedParse(String),
    #[error("feed unavailable: {0}")]
    FeedUnavailable(String),
    #[error("asset missing: {0}")]
    AssetMissing(String),
    #[error("invalid frame set: {0}")]
    InvalidFrames(String),
    #[error("playback failure: {0}")]
    Playback(String),
}

pub type WarnResult<T> = Result<T, WarnError>;
