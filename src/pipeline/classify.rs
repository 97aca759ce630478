//! ELP violation classification.
//!
//! The target category is 49 CFR 391.11(b)(2), the English language
//! proficiency requirement for drivers. Enforcement data spells the section
//! several ways (`11(B)(2)`, `11B2`, `11B2-S`, `11B2-Q`, `11B2-Z`, ...), so
//! matching normalizes the text and accepts the whole `11B2` suffix family.

use crate::pipeline::dates;
use crate::pipeline::types::{ElpViolation, SkipReason};
use crate::schema::ViolationRecord;

/// CFR part carrying the driver qualification rules.
pub const ELP_PART: &str = "391";

/// Normalized form of section 11(b)(2); suffix variants share this prefix.
const SECTION_BASE: &str = "11B2";

/// Indicator spellings that mean the violation put the driver out of
/// service.
const OOS_TRUE: &[&str] = &["true", "t", "y", "yes", "1"];

/// Uppercases and strips everything but ASCII alphanumerics, so
/// `"11(b)(2)"`, `"11B2"` and `"11B2-S"` compare on equal footing.
fn normalize_section(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Returns true when the record cites part 391 section 11(b)(2) in any of
/// its known spellings. Missing fields classify as non-matching.
pub fn is_elp(record: &ViolationRecord) -> bool {
    let part_ok = record.part.as_deref().map(str::trim) == Some(ELP_PART);
    let section_ok = record
        .section
        .as_deref()
        .map(normalize_section)
        .is_some_and(|s| s.starts_with(SECTION_BASE));
    part_ok && section_ok
}

/// Interprets the raw out-of-service indicator. Anything outside the known
/// truthy spellings, including absence, is not OOS.
pub fn is_oos(indicator: Option<&str>) -> bool {
    indicator
        .map(|s| s.trim().to_ascii_lowercase())
        .is_some_and(|s| OOS_TRUE.contains(&s.as_str()))
}

/// Screens one canonical violation row into a kept [`ElpViolation`] or a
/// typed skip reason. `since_year` is the analysis-window cutoff, applied
/// after a successful date parse.
pub fn screen(record: ViolationRecord, since_year: i32) -> Result<ElpViolation, SkipReason> {
    if !is_elp(&record) {
        return Err(SkipReason::OffCategory);
    }

    let inspection_id = record.inspection_id.ok_or(SkipReason::MissingId)?;

    let month = record
        .date
        .as_deref()
        .and_then(dates::parse_month)
        .ok_or(SkipReason::BadDate)?;

    if month.year < since_year {
        return Err(SkipReason::BeforeCutoff);
    }

    Ok(ElpViolation {
        inspection_id,
        month,
        oos: is_oos(record.oos_indicator.as_deref()),
    })
}
