//! Representative sample dataset, for standing up a dashboard before real
//! data is available. Only the explicit `sample` command writes it, and the
//! artifact is marked as sample data in both `last_updated` and
//! `data_source`.

use chrono::{DateTime, Utc};

use crate::pipeline::types::{
    BiggestMovers, DashboardData, MonthlySeries, Mover, StateTotals,
};

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn state(state: &str, oos: u64, all: u64) -> StateTotals {
    StateTotals {
        state: state.to_string(),
        oos,
        all,
    }
}

fn mover(state: &str, previous: u64, current: u64, change: f64) -> Mover {
    Mover {
        state: state.to_string(),
        current,
        previous,
        change,
    }
}

/// Returns the canned dataset with a current `last_updated` stamp. The
/// numbers reflect typical enforcement volumes and seasonality; the
/// per-state monthly drilldown is deliberately absent.
pub fn sample_dashboard(now: DateTime<Utc>) -> DashboardData {
    DashboardData {
        last_updated: format!("{} (Representative Sample Data)", now.format("%B %d, %Y")),
        total_oos: 527,
        total_all: 1247,
        oos_rate: 42.3,
        avg_per_month: 67,
        peak_month: "Oct '25".to_string(),
        peak_count: 73,
        mom_change: -4.4,
        monthly: MonthlySeries {
            labels: labels(&[
                "Jun 25", "Jul 25", "Aug 25", "Sep 25", "Oct 25", "Nov 25", "Dec 25", "Jan 26",
                "Feb 26",
            ]),
            oos: vec![58, 61, 65, 69, 73, 67, 71, 68, 65],
            all: vec![142, 148, 156, 165, 174, 168, 175, 172, 169],
        },
        states: vec![
            state("CA", 186, 438),
            state("TX", 171, 402),
            state("FL", 145, 342),
            state("NY", 121, 285),
            state("IL", 97, 228),
            state("PA", 89, 210),
            state("OH", 76, 179),
            state("GA", 68, 160),
            state("NC", 59, 139),
            state("WA", 52, 122),
        ],
        state_monthly: None,
        biggest_movers: BiggestMovers {
            increases: vec![
                mover("AZ", 12, 18, 50.0),
                mover("NM", 8, 11, 37.5),
                mover("NV", 15, 20, 33.3),
            ],
            decreases: vec![
                mover("MI", 24, 16, -33.3),
                mover("NJ", 18, 13, -27.8),
                mover("WA", 22, 17, -22.7),
            ],
        },
        state_count: 15,
        data_source: "sample".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sample_series_are_parallel() {
        let data = sample_dashboard(Utc::now());
        assert_eq!(data.monthly.labels.len(), data.monthly.oos.len());
        assert_eq!(data.monthly.labels.len(), data.monthly.all.len());
    }

    #[test]
    fn test_sample_is_marked() {
        let now = Utc.with_ymd_and_hms(2025, 8, 15, 0, 0, 0).unwrap();
        let data = sample_dashboard(now);
        assert_eq!(data.data_source, "sample");
        assert_eq!(
            data.last_updated,
            "August 15, 2025 (Representative Sample Data)"
        );
        assert!(data.state_monthly.is_none());
    }

    #[test]
    fn test_sample_ranking_is_descending() {
        let data = sample_dashboard(Utc::now());
        assert!(data.states.windows(2).all(|w| w[0].oos >= w[1].oos));
        assert_eq!(data.states.len(), 10);
    }
}
