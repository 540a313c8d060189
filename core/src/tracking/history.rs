use crate::feed_interface::WarningCode;
use std::collections::BTreeSet;

/// Warning sets remembered between evaluations for the life of the process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarningHistory {
    initial: BTreeSet<WarningCode>,
    previous: BTreeSet<WarningCode>,
    primed: bool,
}

impl WarningHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History that has already seen its first snapshot.
    pub fn from_parts(initial: BTreeSet<WarningCode>, previous: BTreeSet<WarningCode>) -> Self {
        Self {
            initial,
            previous,
            primed: true,
        }
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }

    pub fn initial(&self) -> &BTreeSet<WarningCode> {
        &self.initial
    }

    pub fn previous(&self) -> &BTreeSet<WarningCode> {
        &self.previous
    }

    /// Records `active` as the latest snapshot and returns the codes that are
    /// newly active. The first snapshot only primes the history.
    pub fn observe(&mut self, active: &BTreeSet<WarningCode>) -> BTreeSet<WarningCode> {
        if !self.primed {
            self.initial = active.clone();
            self.previous = active.clone();
            self.primed = true;
            return BTreeSet::new();
        }

        let newly_active = active
            .iter()
            .filter(|code| !self.previous.contains(code) && !self.initial.contains(code))
            .copied()
            .collect();
        self.previous = active.clone();
        newly_active
    }
}
