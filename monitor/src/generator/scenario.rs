use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use warncore::feed_interface::CANCEL;
use warncore::WarningCode;

/// Configuration for generating synthetic `warnsum` snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub seed: u64,
    /// Chance per poll that a new warning is issued.
    pub issue_probability: f64,
    /// Chance per poll that one active warning is cancelled.
    pub cancel_probability: f64,
    pub max_active: usize,
    /// Warnings already in force when the scenario begins.
    pub initial: Vec<WarningCode>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            issue_probability: 0.2,
            cancel_probability: 0.1,
            max_active: 6,
            initial: vec![WarningCode::VeryHot],
        }
    }
}

/// Seeded random walk over the tracked warnings, one snapshot per poll.
pub struct ScenarioGenerator {
    config: ScenarioConfig,
    rng: StdRng,
    active: BTreeSet<WarningCode>,
}

impl ScenarioGenerator {
    pub fn new(config: ScenarioConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let active = config.initial.iter().copied().collect();
        Self {
            config,
            rng,
            active,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(ScenarioConfig {
            seed,
            ..Default::default()
        })
    }

    pub fn next_snapshot(&mut self) -> Value {
        let mut cancelled = Vec::new();

        if !self.active.is_empty()
            && self.rng.gen_bool(self.config.cancel_probability.clamp(0.0, 1.0))
        {
            let pick = self.rng.gen_range(0..self.active.len());
            if let Some(code) = self.active.iter().nth(pick).copied() {
                self.active.remove(&code);
                cancelled.push(code);
            }
        }

        if self.active.len() < self.config.max_active
            && self.rng.gen_bool(self.config.issue_probability.clamp(0.0, 1.0))
        {
            let idle: Vec<WarningCode> = WarningCode::ALL
                .iter()
                .copied()
                .filter(|code| !self.active.contains(code) && !cancelled.contains(code))
                .collect();
            if !idle.is_empty() {
                let code = idle[self.rng.gen_range(0..idle.len())];
                self.active.insert(code);
            }
        }

        build_snapshot(&self.active, &cancelled)
    }

    #[cfg(test)]
    pub fn active(&self) -> &BTreeSet<WarningCode> {
        &self.active
    }
}

/// Shapes warnings the way the feed reports them, cancellations included.
pub fn build_snapshot(active: &BTreeSet<WarningCode>, cancelled: &[WarningCode]) -> Value {
    let mut records = Map::new();
    for code in active {
        records.insert(
            code.code().to_string(),
            json!({ "name": code.code(), "code": code.code(), "actionCode": "ISSUE" }),
        );
    }
    for code in cancelled {
        records.insert(
            code.code().to_string(),
            json!({ "name": code.code(), "code": code.code(), "actionCode": CANCEL }),
        );
    }
    Value::Object(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warncore::feed_interface::{active_codes, parse_records};

    #[test]
    fn same_seed_replays_the_same_scenario() {
        let mut first = ScenarioGenerator::with_seed(7);
        let mut second = ScenarioGenerator::with_seed(7);
        for _ in 0..50 {
            assert_eq!(first.next_snapshot(), second.next_snapshot());
        }
    }

    #[test]
    fn snapshots_parse_as_feed_records() {
        let mut generator = ScenarioGenerator::new(ScenarioConfig {
            seed: 3,
            issue_probability: 1.0,
            cancel_probability: 0.5,
            max_active: 4,
            initial: vec![],
        });
        for _ in 0..20 {
            let snapshot = generator.next_snapshot();
            let records = parse_records(&snapshot).unwrap();
            assert_eq!(&active_codes(&records), generator.active());
            assert!(generator.active().len() <= 4);
        }
    }

    #[test]
    fn cancelled_warnings_are_reported_inactive() {
        let active: BTreeSet<_> = [WarningCode::Signal3].into_iter().collect();
        let snapshot = build_snapshot(&active, &[WarningCode::Signal1]);
        let records = parse_records(&snapshot).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(active_codes(&records), active);
    }
}
