//! Inspection-to-state resolution and the violation join.
//!
//! Violation rows carry no state, so each one is joined to its inspection
//! through an identifier index. The index is built incrementally from
//! batches of inspection rows and only retains identifiers the current run
//! actually needs, which keeps it small next to the full inspection file.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::pipeline::types::{ElpViolation, MatchedViolation};
use crate::schema::InspectionRecord;

/// Identifier to state mapping, restricted to a wanted set.
#[derive(Debug, Default)]
pub struct StateIndex {
    wanted: HashSet<String>,
    states: HashMap<String, String>,
}

impl StateIndex {
    /// Seeds the index with the inspection ids of the screened violations.
    pub fn for_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            wanted: ids.into_iter().collect(),
            states: HashMap::new(),
        }
    }

    /// Records one inspection row. Identifiers outside the wanted set are
    /// ignored; a repeated identifier keeps the most recently observed
    /// state. Returns whether the row was relevant.
    pub fn note(&mut self, record: InspectionRecord) -> bool {
        if !self.wanted.contains(&record.inspection_id) {
            return false;
        }
        self.states.insert(record.inspection_id, record.state);
        true
    }

    /// Feeds a batch of inspection rows and returns how many were relevant.
    /// Batches may arrive in any number, size, and order.
    pub fn absorb<I>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = InspectionRecord>,
    {
        batch.into_iter().map(|record| usize::from(self.note(record))).sum()
    }

    /// True once every wanted identifier has a state. Callers use this to
    /// stop requesting further inspection batches.
    pub fn is_complete(&self) -> bool {
        self.states.len() == self.wanted.len()
    }

    pub fn wanted(&self) -> usize {
        self.wanted.len()
    }

    pub fn resolved(&self) -> usize {
        self.states.len()
    }

    pub fn state_of(&self, inspection_id: &str) -> Option<&str> {
        self.states.get(inspection_id).map(String::as_str)
    }
}

/// Outcome of joining screened violations against the state index.
#[derive(Debug)]
pub struct JoinOutcome {
    pub matched: Vec<MatchedViolation>,
    /// Violations whose identifier never resolved to a state.
    pub unmatched: u64,
    /// Extra rows collapsed by the last-seen dedup policy.
    pub duplicates: u64,
}

/// Joins violations to their inspection state.
///
/// Violations sharing an identifier collapse to the last one seen, and an
/// identifier with no resolved state drops the record. Both cases are
/// counted for diagnostics rather than treated as errors.
pub fn match_violations<I>(violations: I, index: &StateIndex) -> JoinOutcome
where
    I: IntoIterator<Item = ElpViolation>,
{
    let mut by_id: BTreeMap<String, ElpViolation> = BTreeMap::new();
    let mut duplicates = 0u64;
    for violation in violations {
        if by_id.insert(violation.inspection_id.clone(), violation).is_some() {
            duplicates += 1;
        }
    }

    let mut matched = Vec::with_capacity(by_id.len());
    let mut unmatched = 0u64;
    for (id, violation) in by_id {
        match index.state_of(&id) {
            Some(state) => matched.push(MatchedViolation {
                month: violation.month,
                state: state.to_string(),
                oos: violation.oos,
            }),
            None => unmatched += 1,
        }
    }

    JoinOutcome {
        matched,
        unmatched,
        duplicates,
    }
}
