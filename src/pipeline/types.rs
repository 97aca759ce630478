//! Record types flowing through the pipeline and the dashboard artifact.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::pipeline::dates::MonthKey;

/// A violation row that survived screening: ELP category, usable date,
/// joinable identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElpViolation {
    pub inspection_id: String,
    pub month: MonthKey,
    pub oos: bool,
}

/// An [`ElpViolation`] whose inspection identifier resolved to a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedViolation {
    pub month: MonthKey,
    pub state: String,
    pub oos: bool,
}

/// Why a violation row was excluded during screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not an ELP violation (wrong part or section family).
    OffCategory,
    /// No inspection identifier to join on.
    MissingId,
    /// Date missing or in no known encoding.
    BadDate,
    /// Parsed fine but predates the analysis window.
    BeforeCutoff,
}

/// Per-run screening diagnostics. Skipped rows are counted, never fatal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanCounts {
    pub scanned: u64,
    pub kept: u64,
    pub off_category: u64,
    pub missing_id: u64,
    pub bad_date: u64,
    pub before_cutoff: u64,
    /// Rows the CSV reader could not decode at all.
    pub malformed: u64,
}

impl ScanCounts {
    pub fn skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::OffCategory => self.off_category += 1,
            SkipReason::MissingId => self.missing_id += 1,
            SkipReason::BadDate => self.bad_date += 1,
            SkipReason::BeforeCutoff => self.before_cutoff += 1,
        }
    }
}

/// Out-of-service / total counters for one bucket. `oos <= all` holds by
/// construction: every record bumps `all`, only OOS records bump `oos`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    pub oos: u64,
    pub all: u64,
}

impl BucketCounts {
    /// Counts one matched violation.
    pub fn record(&mut self, oos: bool) {
        self.all += 1;
        if oos {
            self.oos += 1;
        }
    }

    /// Folds another bucket's counts into this one.
    pub fn absorb(&mut self, other: BucketCounts) {
        self.oos += other.oos;
        self.all += other.all;
    }
}

/// Chronologically ascending parallel arrays for the monthly trend chart.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySeries {
    pub labels: Vec<String>,
    pub oos: Vec<u64>,
    pub all: Vec<u64>,
}

/// One row of the ranked state table.
#[derive(Debug, Clone, Serialize)]
pub struct StateTotals {
    pub state: String,
    pub oos: u64,
    pub all: u64,
}

/// One state's movement between the two reference months.
#[derive(Debug, Clone, Serialize)]
pub struct Mover {
    pub state: String,
    pub current: u64,
    pub previous: u64,
    pub change: f64,
}

/// Largest relative movers, split by direction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BiggestMovers {
    pub increases: Vec<Mover>,
    pub decreases: Vec<Mover>,
}

/// The dashboard artifact. Field names and nesting are a compatibility
/// contract with the published dashboard; renaming anything here breaks
/// consumers.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub last_updated: String,
    pub total_oos: u64,
    pub total_all: u64,
    pub oos_rate: f64,
    pub avg_per_month: u64,
    pub peak_month: String,
    pub peak_count: u64,
    pub mom_change: f64,
    pub monthly: MonthlySeries,
    pub states: Vec<StateTotals>,
    /// Per-state monthly drilldown, keyed by chart label. Absent from the
    /// sample dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_monthly: Option<BTreeMap<String, BTreeMap<String, BucketCounts>>>,
    pub biggest_movers: BiggestMovers,
    pub state_count: usize,
    pub data_source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_record_and_absorb() {
        let mut a = BucketCounts::default();
        a.record(true);
        a.record(false);
        assert_eq!(a, BucketCounts { oos: 1, all: 2 });

        let mut b = BucketCounts { oos: 2, all: 5 };
        b.absorb(a);
        assert_eq!(b, BucketCounts { oos: 3, all: 7 });
    }

    #[test]
    fn test_scan_counts_skip_routing() {
        let mut counts = ScanCounts::default();
        counts.skip(SkipReason::OffCategory);
        counts.skip(SkipReason::MissingId);
        counts.skip(SkipReason::BadDate);
        counts.skip(SkipReason::BadDate);
        counts.skip(SkipReason::BeforeCutoff);
        assert_eq!(counts.off_category, 1);
        assert_eq!(counts.missing_id, 1);
        assert_eq!(counts.bad_date, 2);
        assert_eq!(counts.before_cutoff, 1);
    }
}
