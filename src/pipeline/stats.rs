//! Derived statistics over the finalized count tables.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::pipeline::aggregate::Tally;
use crate::pipeline::dates::MonthKey;
use crate::pipeline::types::{
    BiggestMovers, BucketCounts, DashboardData, MonthlySeries, Mover, StateTotals,
};

/// Ranked state table length in the artifact.
const TOP_STATES: usize = 10;

/// Mover list length per direction.
const TOP_MOVERS: usize = 3;

/// Minimum previous-month OOS count for a state to qualify as a mover.
/// Filters out the huge percentages tiny denominators produce.
const MOVER_FLOOR: u64 = 5;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Share of OOS violations as a percentage, one decimal. Zero when there is
/// no data.
pub fn oos_rate(oos: u64, all: u64) -> f64 {
    if all == 0 {
        return 0.0;
    }
    round1(oos as f64 / all as f64 * 100.0)
}

/// Mean OOS count across the months that have data, rounded to a whole
/// number. Zero when no month has data.
pub fn avg_per_month(total_oos: u64, months_with_data: usize) -> u64 {
    if months_with_data == 0 {
        return 0;
    }
    (total_oos as f64 / months_with_data as f64).round() as u64
}

/// Month with the highest OOS count. Scans ascending, so ties resolve to
/// the earliest month.
pub fn peak_month(monthly: &BTreeMap<MonthKey, BucketCounts>) -> Option<(MonthKey, u64)> {
    let mut peak: Option<(MonthKey, u64)> = None;
    for (month, counts) in monthly {
        match peak {
            Some((_, best)) if counts.oos <= best => {}
            _ => peak = Some((*month, counts.oos)),
        }
    }
    peak
}

/// Percentage change between the two most recent complete months of the
/// OOS series. The final month is still accumulating and is skipped when
/// at least three months exist; with exactly two, the latest pair is
/// compared. Fewer months, or a zero comparison base, yield zero.
pub fn mom_change(oos_series: &[u64]) -> f64 {
    let n = oos_series.len();
    let (current, previous) = if n >= 3 {
        (oos_series[n - 2], oos_series[n - 3])
    } else if n == 2 {
        (oos_series[1], oos_series[0])
    } else {
        return 0.0;
    };

    if previous == 0 {
        return 0.0;
    }
    round1((current as f64 - previous as f64) / previous as f64 * 100.0)
}

/// State buckets ranked by OOS count descending, ties broken by state code
/// ascending, truncated to [`TOP_STATES`] entries.
pub fn top_states(states: &BTreeMap<String, BucketCounts>) -> Vec<StateTotals> {
    let mut ranked: Vec<StateTotals> = states
        .iter()
        .map(|(state, counts)| StateTotals {
            state: state.clone(),
            oos: counts.oos,
            all: counts.all,
        })
        .collect();
    ranked.sort_by(|a, b| b.oos.cmp(&a.oos).then_with(|| a.state.cmp(&b.state)));
    ranked.truncate(TOP_STATES);
    ranked
}

/// States with the largest relative OOS change between the two reference
/// months (the same pair [`mom_change`] uses). States below the volume
/// floor in the previous month are excluded; increases and decreases are
/// ranked separately, strongest first. Requires at least three months of
/// history, otherwise both lists are empty.
pub fn biggest_movers(
    state_monthly: &BTreeMap<String, BTreeMap<MonthKey, BucketCounts>>,
    months: &[MonthKey],
) -> BiggestMovers {
    if months.len() < 3 {
        return BiggestMovers::default();
    }
    let current_month = months[months.len() - 2];
    let previous_month = months[months.len() - 3];

    let mut movers = Vec::new();
    for (state, by_month) in state_monthly {
        let current = by_month.get(&current_month).map_or(0, |c| c.oos);
        let previous = by_month.get(&previous_month).map_or(0, |c| c.oos);
        if previous < MOVER_FLOOR {
            continue;
        }
        movers.push(Mover {
            state: state.clone(),
            current,
            previous,
            change: round1((current as f64 - previous as f64) / previous as f64 * 100.0),
        });
    }

    let mut increases: Vec<Mover> = movers.iter().filter(|m| m.change > 0.0).cloned().collect();
    increases.sort_by(|a, b| b.change.total_cmp(&a.change).then_with(|| a.state.cmp(&b.state)));
    increases.truncate(TOP_MOVERS);

    let mut decreases: Vec<Mover> = movers.into_iter().filter(|m| m.change < 0.0).collect();
    decreases.sort_by(|a, b| a.change.total_cmp(&b.change).then_with(|| a.state.cmp(&b.state)));
    decreases.truncate(TOP_MOVERS);

    BiggestMovers {
        increases,
        decreases,
    }
}

/// Derives every dashboard statistic from a finalized tally. `now` is
/// injected so output is reproducible in tests.
pub fn build_dashboard(tally: &Tally, data_source: &str, now: DateTime<Utc>) -> DashboardData {
    let months = tally.months();

    let mut labels = Vec::with_capacity(months.len());
    let mut oos_series = Vec::with_capacity(months.len());
    let mut all_series = Vec::with_capacity(months.len());
    for (month, counts) in &tally.monthly {
        labels.push(month.label());
        oos_series.push(counts.oos);
        all_series.push(counts.all);
    }

    let (peak_label, peak_count) = match peak_month(&tally.monthly) {
        Some((month, count)) => (month.quoted_label(), count),
        None => ("N/A".to_string(), 0),
    };

    let mom = mom_change(&oos_series);

    let state_monthly = tally
        .state_monthly
        .iter()
        .map(|(state, by_month)| {
            let cells = by_month
                .iter()
                .map(|(month, counts)| (month.label(), *counts))
                .collect();
            (state.clone(), cells)
        })
        .collect();

    DashboardData {
        last_updated: now.format("%B %d, %Y").to_string(),
        total_oos: tally.total.oos,
        total_all: tally.total.all,
        oos_rate: oos_rate(tally.total.oos, tally.total.all),
        avg_per_month: avg_per_month(tally.total.oos, months.len()),
        peak_month: peak_label,
        peak_count,
        mom_change: mom,
        monthly: MonthlySeries {
            labels,
            oos: oos_series,
            all: all_series,
        },
        states: top_states(&tally.states),
        state_monthly: Some(state_monthly),
        biggest_movers: biggest_movers(&tally.state_monthly, &months),
        state_count: tally.states.values().filter(|c| c.oos > 0).count(),
        data_source: data_source.to_string(),
    }
}
