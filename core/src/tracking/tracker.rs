use crate::feed_interface::{active_codes, parse_records, WarningCode};
use crate::prelude::{WarnError, WarnResult};
use crate::telemetry::log::LogManager;
use crate::tracking::history::WarningHistory;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// What the fetch collaborator delivered for one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedInput {
    Fetched(Value),
    Unavailable(String),
}

/// Whether an evaluation reflects the feed or the last known state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub active: BTreeSet<WarningCode>,
    pub newly_active: BTreeSet<WarningCode>,
    pub freshness: Freshness,
    pub evaluated_at: f64,
}

/// Diffs each feed snapshot against the warning history.
pub struct WarningStateTracker {
    history: WarningHistory,
    last_success: Option<f64>,
    logger: LogManager,
}

impl WarningStateTracker {
    pub fn new() -> Self {
        Self::with_history(WarningHistory::new())
    }

    pub fn with_history(history: WarningHistory) -> Self {
        Self {
            history,
            last_success: None,
            logger: LogManager::new("warncore::tracker"),
        }
    }

    /// Evaluates one poll result. Never fails: a malformed or missing snapshot
    /// yields the last known active set, no new warnings, and `Stale`.
    pub fn evaluate(&mut self, input: &FeedInput, now: f64) -> Evaluation {
        match Self::snapshot(input) {
            Ok(active) => {
                let newly_active = self.history.observe(&active);
                self.last_success = Some(now);
                if !newly_active.is_empty() {
                    self.logger
                        .record(&format!("newly active warnings: {}", join(&newly_active)));
                }
                Evaluation {
                    active,
                    newly_active,
                    freshness: Freshness::Fresh,
                    evaluated_at: now,
                }
            }
            Err(err) => {
                self.logger
                    .warn(&format!("keeping last known warnings: {}", err));
                Evaluation {
                    active: self.history.previous().clone(),
                    newly_active: BTreeSet::new(),
                    freshness: Freshness::Stale,
                    evaluated_at: now,
                }
            }
        }
    }

    fn snapshot(input: &FeedInput) -> WarnResult<BTreeSet<WarningCode>> {
        match input {
            FeedInput::Fetched(value) => {
                let records = parse_records(value)?;
                Ok(active_codes(&records))
            }
            FeedInput::Unavailable(reason) => Err(WarnError::FeedUnavailable(reason.clone())),
        }
    }

    pub fn history(&self) -> &WarningHistory {
        &self.history
    }

    /// Time of the last evaluation that parsed successfully.
    pub fn last_success(&self) -> Option<f64> {
        self.last_success
    }
}

impl Default for WarningStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn join(codes: &BTreeSet<WarningCode>) -> String {
    codes
        .iter()
        .map(|code| code.code())
        .collect::<Vec<_>>()
        .join(", ")
}
