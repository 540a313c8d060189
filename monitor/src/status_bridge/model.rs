use crate::assets::IconOrigin;
use crate::workflow::runner::TickReport;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use warncore::animation::FramePolicy;
use warncore::telemetry::MetricsSnapshot;
use warncore::{Freshness, SequenceState, WarningCode};

/// One icon on the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WarningTile {
    pub code: WarningCode,
    pub frame_index: usize,
    pub frame_count: usize,
    pub policy: FramePolicy,
    /// Bridge path serving the current frame as PNG.
    pub icon_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<IconOrigin>,
}

pub fn icon_path(code: WarningCode, index: usize) -> String {
    format!("/icon/{}/{}", code, index)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SoundStatus {
    pub state: SequenceState,
    pub code: Option<WarningCode>,
}

/// What the board renders, published once per tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BoardModel {
    pub title: String,
    pub tick: u64,
    pub elapsed_secs: f64,
    pub freshness: Option<Freshness>,
    pub no_active: bool,
    pub warnings: Vec<WarningTile>,
    pub sound: SoundStatus,
    pub metrics: MetricsSnapshot,
    pub updated_unix_secs: u64,
}

impl BoardModel {
    pub fn from_report<F, O>(
        title: &str,
        report: &TickReport<F>,
        metrics: MetricsSnapshot,
        origin: O,
    ) -> Self
    where
        O: Fn(WarningCode) -> Option<IconOrigin>,
    {
        let warnings = report
            .frames
            .iter()
            .map(|frame| WarningTile {
                code: frame.code,
                frame_index: frame.index,
                frame_count: frame.frame_count,
                policy: frame.policy,
                icon_path: icon_path(frame.code, frame.index),
                origin: origin(frame.code),
            })
            .collect();

        Self {
            title: title.to_string(),
            tick: report.tick,
            elapsed_secs: report.elapsed_secs,
            freshness: report.freshness(),
            no_active: report.no_active(),
            warnings,
            sound: SoundStatus {
                state: report.sound_state,
                code: report.sound_code,
            },
            metrics,
            updated_unix_secs: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default(),
        }
    }
}
