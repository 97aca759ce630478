//! Accumulation of matched violations into the monthly and state tables.

use std::collections::BTreeMap;

use crate::pipeline::dates::MonthKey;
use crate::pipeline::types::{BucketCounts, MatchedViolation};

/// Aggregation state: one bucket per month, per state, and per state-month
/// cell, plus the running total. All tables are ordered maps so iteration,
/// and therefore the frozen artifact, is deterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub monthly: BTreeMap<MonthKey, BucketCounts>,
    pub states: BTreeMap<String, BucketCounts>,
    pub state_monthly: BTreeMap<String, BTreeMap<MonthKey, BucketCounts>>,
    pub total: BucketCounts,
}

impl Tally {
    /// Counts one matched violation in all three tables and the total.
    /// Buckets appear on first use and are never decremented.
    pub fn add(&mut self, violation: &MatchedViolation) {
        self.total.record(violation.oos);
        self.monthly
            .entry(violation.month)
            .or_default()
            .record(violation.oos);
        self.states
            .entry(violation.state.clone())
            .or_default()
            .record(violation.oos);
        self.state_monthly
            .entry(violation.state.clone())
            .or_default()
            .entry(violation.month)
            .or_default()
            .record(violation.oos);
    }

    /// Folds another tally into this one. Addition commutes, so splitting
    /// records across tallies and merging gives the same result as one
    /// sequential pass.
    pub fn merge(&mut self, other: Tally) {
        self.total.absorb(other.total);
        for (month, counts) in other.monthly {
            self.monthly.entry(month).or_default().absorb(counts);
        }
        for (state, counts) in other.states {
            self.states.entry(state).or_default().absorb(counts);
        }
        for (state, months) in other.state_monthly {
            let table = self.state_monthly.entry(state).or_default();
            for (month, counts) in months {
                table.entry(month).or_default().absorb(counts);
            }
        }
    }

    /// Months observed, ascending.
    pub fn months(&self) -> Vec<MonthKey> {
        self.monthly.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.total.all == 0
    }
}

impl FromIterator<MatchedViolation> for Tally {
    fn from_iter<I: IntoIterator<Item = MatchedViolation>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for violation in iter {
            tally.add(&violation);
        }
        tally
    }
}
