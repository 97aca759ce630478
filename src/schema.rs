//! Canonical record types and the schema adapters that produce them.
//!
//! FMCSA publishes the same logical fields under different names depending
//! on dataset and era (`PART_NO` vs `part_no`, `CHANGE_DATE` vs
//! `INSP_DATE`, a combined `violation_code` instead of separate part and
//! section columns). Each known shape is translated here, at the boundary,
//! so the pipeline only ever sees one record type per dataset.

use csv::StringRecord;
use serde_json::{Map, Value};

// Field aliases in priority order, compared case-insensitively.
const VIOLATION_ID: &[&str] = &["inspection_id"];
const VIOLATION_PART: &[&str] = &["part_no"];
const VIOLATION_SECTION: &[&str] = &["part_no_section"];
const VIOLATION_CODE: &[&str] = &["violation_code"];
const VIOLATION_DATE: &[&str] = &["change_date", "inspection_date", "insp_date"];
const VIOLATION_OOS: &[&str] = &["out_of_service_indicator", "oos_indicator"];

const INSPECTION_ID: &[&str] = &["inspection_id"];
const INSPECTION_STATE: &[&str] = &["report_state", "state"];
const INSPECTION_DATE: &[&str] = &["insp_date", "inspection_date"];

/// One violation row in canonical shape. Everything is optional at this
/// boundary; screening decides what the absence of a field means.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ViolationRecord {
    pub inspection_id: Option<String>,
    pub part: Option<String>,
    pub section: Option<String>,
    pub date: Option<String>,
    pub oos_indicator: Option<String>,
}

/// One inspection row in canonical shape. Rows without an identifier or a
/// state cannot participate in the join, so the adapters drop them early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionRecord {
    pub inspection_id: String,
    pub state: String,
    pub date: Option<String>,
}

fn none_if_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Splits a combined code like `"391.11B2"` into part and section.
fn split_code(code: &str) -> (Option<String>, Option<String>) {
    match code.split_once('.') {
        Some((part, section)) => (none_if_empty(part), none_if_empty(section)),
        None => (none_if_empty(code), None),
    }
}

/// When the section column is absent, the combined violation code supplies
/// it (and the part too if that column was also absent).
fn merge_code(
    part: Option<String>,
    section: Option<String>,
    code: Option<String>,
) -> (Option<String>, Option<String>) {
    if section.is_some() {
        return (part, section);
    }
    match code {
        Some(code) => {
            let (code_part, code_section) = split_code(&code);
            (part.or(code_part), code_section)
        }
        None => (part, None),
    }
}

/// Pulls the first non-empty value among `aliases` out of a JSON object.
/// Socrata serves identifiers as numbers in some vintages, so numeric
/// values are stringified rather than dropped.
fn pick(object: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        for (key, value) in object {
            if !key.eq_ignore_ascii_case(alias) {
                continue;
            }
            let text = match value {
                Value::String(s) => none_if_empty(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            };
            if text.is_some() {
                return text;
            }
        }
    }
    None
}

impl ViolationRecord {
    /// Adapts one Socrata JSON object.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let (part, section) = merge_code(
            pick(object, VIOLATION_PART),
            pick(object, VIOLATION_SECTION),
            pick(object, VIOLATION_CODE),
        );
        Self {
            inspection_id: pick(object, VIOLATION_ID),
            part,
            section,
            date: pick(object, VIOLATION_DATE),
            oos_indicator: pick(object, VIOLATION_OOS),
        }
    }
}

impl InspectionRecord {
    /// Adapts one Socrata JSON object, or `None` if it cannot join.
    pub fn from_json(object: &Map<String, Value>) -> Option<Self> {
        Some(Self {
            inspection_id: pick(object, INSPECTION_ID)?,
            state: pick(object, INSPECTION_STATE)?,
            date: pick(object, INSPECTION_DATE),
        })
    }
}

fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    for alias in aliases {
        if let Some(index) = headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(alias))
        {
            return Some(index);
        }
    }
    None
}

fn cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index.and_then(|i| record.get(i)).and_then(none_if_empty)
}

/// Column positions for a violations CSV, resolved once from the header
/// row and applied to every record.
#[derive(Debug, Clone)]
pub struct ViolationColumns {
    id: Option<usize>,
    part: Option<usize>,
    section: Option<usize>,
    code: Option<usize>,
    date: Option<usize>,
    oos: Option<usize>,
}

impl ViolationColumns {
    pub fn resolve(headers: &StringRecord) -> Self {
        Self {
            id: find_column(headers, VIOLATION_ID),
            part: find_column(headers, VIOLATION_PART),
            section: find_column(headers, VIOLATION_SECTION),
            code: find_column(headers, VIOLATION_CODE),
            date: find_column(headers, VIOLATION_DATE),
            oos: find_column(headers, VIOLATION_OOS),
        }
    }

    pub fn extract(&self, record: &StringRecord) -> ViolationRecord {
        let (part, section) = merge_code(
            cell(record, self.part),
            cell(record, self.section),
            cell(record, self.code),
        );
        ViolationRecord {
            inspection_id: cell(record, self.id),
            part,
            section,
            date: cell(record, self.date),
            oos_indicator: cell(record, self.oos),
        }
    }
}

/// Column positions for an inspections CSV.
#[derive(Debug, Clone)]
pub struct InspectionColumns {
    id: Option<usize>,
    state: Option<usize>,
    date: Option<usize>,
}

impl InspectionColumns {
    pub fn resolve(headers: &StringRecord) -> Self {
        Self {
            id: find_column(headers, INSPECTION_ID),
            state: find_column(headers, INSPECTION_STATE),
            date: find_column(headers, INSPECTION_DATE),
        }
    }

    pub fn extract(&self, record: &StringRecord) -> Option<InspectionRecord> {
        Some(InspectionRecord {
            inspection_id: cell(record, self.id)?,
            state: cell(record, self.state)?,
            date: cell(record, self.date),
        })
    }
}
