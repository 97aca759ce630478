use chrono::{TimeZone, Utc};
use elp_tracker::pipeline::aggregate::Tally;
use elp_tracker::pipeline::classify;
use elp_tracker::pipeline::join::{self, StateIndex};
use elp_tracker::pipeline::stats;
use elp_tracker::pipeline::types::DashboardData;
use elp_tracker::schema::{InspectionRecord, ViolationRecord};

fn violation(id: &str, date: &str, part: &str, section: &str, oos: &str) -> ViolationRecord {
    ViolationRecord {
        inspection_id: Some(id.to_string()),
        part: Some(part.to_string()),
        section: Some(section.to_string()),
        date: Some(date.to_string()),
        oos_indicator: Some(oos.to_string()),
    }
}

fn inspection(id: &str, state: &str, date: &str) -> InspectionRecord {
    InspectionRecord {
        inspection_id: id.to_string(),
        state: state.to_string(),
        date: Some(date.to_string()),
    }
}

/// Runs screen, join, aggregate, and derive the way the CLI does, with a
/// fixed clock.
fn run_pipeline(
    violations: Vec<ViolationRecord>,
    inspections: Vec<InspectionRecord>,
) -> DashboardData {
    let kept: Vec<_> = violations
        .into_iter()
        .filter_map(|record| classify::screen(record, 2025).ok())
        .collect();

    let mut index = StateIndex::for_ids(kept.iter().map(|v| v.inspection_id.clone()));
    index.absorb(inspections);

    let outcome = join::match_violations(kept, &index);
    let tally: Tally = outcome.matched.into_iter().collect();

    let now = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
    stats::build_dashboard(&tally, "real", now)
}

#[test]
fn test_single_oos_violation_end_to_end() {
    let data = run_pipeline(
        vec![violation("1", "20250601", "391", "11(B)(2)", "Y")],
        vec![inspection("1", "CA", "20250601")],
    );

    assert_eq!(data.total_oos, 1);
    assert_eq!(data.total_all, 1);
    assert_eq!(data.oos_rate, 100.0);
    assert_eq!(data.monthly.labels, vec!["Jun 25"]);
    assert_eq!(data.monthly.oos, vec![1]);
    assert_eq!(data.monthly.all, vec![1]);
    assert_eq!(data.states.len(), 1);
    assert_eq!(data.states[0].state, "CA");
    assert_eq!(data.states[0].oos, 1);
    assert_eq!(data.peak_month, "Jun '25");
    assert_eq!(data.peak_count, 1);
    assert_eq!(data.state_count, 1);
    assert_eq!(data.last_updated, "August 01, 2025");
    assert_eq!(data.data_source, "real");

    let drilldown = data.state_monthly.expect("real data carries the drilldown");
    assert_eq!(drilldown["CA"]["Jun 25"].oos, 1);
}

#[test]
fn test_unmatched_rows_contribute_nothing() {
    // Violation 99 has no inspection; inspection 7 has no violation.
    let data = run_pipeline(
        vec![
            violation("1", "20250601", "391", "11B2", "N"),
            violation("99", "20250601", "391", "11B2", "Y"),
        ],
        vec![
            inspection("1", "TX", "20250601"),
            inspection("7", "CA", "20250601"),
        ],
    );

    assert_eq!(data.total_all, 1);
    assert_eq!(data.total_oos, 0);
    assert_eq!(data.states.len(), 1);
    assert_eq!(data.states[0].state, "TX");
    assert_eq!(data.state_count, 0);
}

#[test]
fn test_mixed_date_formats_and_variants_land_in_buckets() {
    let data = run_pipeline(
        vec![
            violation("1", "20250601", "391", "11B2", "Y"),
            violation("2", "2025-07-15T00:00:00", "391", "11B2-S", "true"),
            violation("3", "15-JUN-25", "391", "11(b)(2)", "yes"),
            violation("4", "07/02/2025", "391", "11B2-Z", "0"),
            // Rejected: off category, bad date, pre-cutoff.
            violation("5", "20250601", "392", "2B", "Y"),
            violation("6", "garbage", "391", "11B2", "Y"),
            violation("7", "26-DEC-23", "391", "11B2", "Y"),
        ],
        vec![
            inspection("1", "CA", "20250601"),
            inspection("2", "TX", "20250715"),
            inspection("3", "CA", "20250615"),
            inspection("4", "AZ", "20250702"),
            inspection("5", "CA", "20250601"),
            inspection("6", "CA", "20250601"),
            inspection("7", "CA", "20231226"),
        ],
    );

    assert_eq!(data.total_all, 4);
    assert_eq!(data.total_oos, 3);
    assert_eq!(data.monthly.labels, vec!["Jun 25", "Jul 25"]);
    assert_eq!(data.monthly.all, vec![2, 2]);

    // Ranked by OOS count: CA has 2, TX has 1, AZ has 0.
    let order: Vec<&str> = data.states.iter().map(|s| s.state.as_str()).collect();
    assert_eq!(order, vec!["CA", "TX", "AZ"]);
}

#[test]
fn test_artifact_is_byte_identical_across_input_order() {
    let violations = vec![
        violation("1", "20250601", "391", "11B2", "Y"),
        violation("2", "20250715", "391", "11B2-S", "N"),
        violation("3", "15-JUN-25", "391", "11(b)(2)", "yes"),
        violation("4", "07/02/2025", "391", "11B2-Z", "1"),
    ];
    let inspections = vec![
        inspection("1", "CA", "20250601"),
        inspection("2", "TX", "20250715"),
        inspection("3", "CA", "20250615"),
        inspection("4", "AZ", "20250702"),
    ];

    let forward = run_pipeline(violations.clone(), inspections.clone());

    let mut shuffled_violations = violations;
    shuffled_violations.reverse();
    shuffled_violations.swap(0, 2);
    let mut shuffled_inspections = inspections;
    shuffled_inspections.reverse();

    let reordered = run_pipeline(shuffled_violations, shuffled_inspections);

    let a = serde_json::to_string_pretty(&forward).unwrap();
    let b = serde_json::to_string_pretty(&reordered).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_duplicate_violation_ids_collapse() {
    let data = run_pipeline(
        vec![
            violation("1", "20250601", "391", "11B2", "N"),
            violation("1", "20250601", "391", "11B2", "Y"),
        ],
        vec![inspection("1", "CA", "20250601")],
    );

    // Last seen wins; the inspection is counted once.
    assert_eq!(data.total_all, 1);
    assert_eq!(data.total_oos, 1);
}
