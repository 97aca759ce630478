//! Streaming loaders for local FMCSA CSV exports.
//!
//! Full exports run to millions of rows, so both loaders process records as
//! they are read instead of materializing files, and transparently handle
//! gzip-compressed exports. Rows the reader cannot decode are counted and
//! skipped rather than failing the run.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::pipeline::classify;
use crate::pipeline::join::StateIndex;
use crate::pipeline::types::{ElpViolation, ScanCounts};
use crate::schema::{InspectionColumns, ViolationColumns};

/// Rows between progress logs on the debug channel.
const PROGRESS_EVERY: u64 = 100_000;

fn open_csv(path: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    let file =
        File::open(path).with_context(|| format!("could not open {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(csv::ReaderBuilder::new().flexible(true).from_reader(reader))
}

/// Reads a violations export, screening every row. Returns the kept ELP
/// violations and the scan diagnostics.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_violations(path: &Path, since_year: i32) -> Result<(Vec<ElpViolation>, ScanCounts)> {
    let mut reader = open_csv(path)?;
    let columns = ViolationColumns::resolve(
        reader
            .headers()
            .with_context(|| format!("no CSV header in {}", path.display()))?,
    );

    let mut kept = Vec::new();
    let mut counts = ScanCounts::default();

    for row in reader.records() {
        counts.scanned += 1;
        let record = match row {
            Ok(record) => record,
            Err(err) => {
                counts.malformed += 1;
                debug!(error = %err, row = counts.scanned, "unreadable violation row");
                continue;
            }
        };
        match classify::screen(columns.extract(&record), since_year) {
            Ok(violation) => {
                kept.push(violation);
                counts.kept += 1;
            }
            Err(reason) => counts.skip(reason),
        }
        if counts.scanned % PROGRESS_EVERY == 0 {
            debug!(scanned = counts.scanned, kept = counts.kept, "scanning violations");
        }
    }

    info!(
        scanned = counts.scanned,
        kept = counts.kept,
        off_category = counts.off_category,
        missing_id = counts.missing_id,
        bad_date = counts.bad_date,
        before_cutoff = counts.before_cutoff,
        malformed = counts.malformed,
        "violations screened"
    );
    Ok((kept, counts))
}

/// Diagnostics from one pass over an inspections export.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexScan {
    pub scanned: u64,
    pub indexed: u64,
    pub skipped: u64,
    pub malformed: u64,
    /// True when every wanted identifier resolved before the file ended.
    pub stopped_early: bool,
}

/// Streams an inspections export into `index`, stopping as soon as the
/// index is complete. With the wanted set a small fraction of the file this
/// usually means reading only part of it.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn index_inspections(path: &Path, index: &mut StateIndex) -> Result<IndexScan> {
    let mut reader = open_csv(path)?;
    let columns = InspectionColumns::resolve(
        reader
            .headers()
            .with_context(|| format!("no CSV header in {}", path.display()))?,
    );

    let mut scan = IndexScan::default();

    for row in reader.records() {
        if index.is_complete() {
            scan.stopped_early = true;
            break;
        }
        scan.scanned += 1;
        let record = match row {
            Ok(record) => record,
            Err(err) => {
                scan.malformed += 1;
                debug!(error = %err, row = scan.scanned, "unreadable inspection row");
                continue;
            }
        };
        match columns.extract(&record) {
            Some(inspection) => {
                if index.note(inspection) {
                    scan.indexed += 1;
                }
            }
            None => scan.skipped += 1,
        }
        if scan.scanned % PROGRESS_EVERY == 0 {
            debug!(scanned = scan.scanned, resolved = index.resolved(), "scanning inspections");
        }
    }

    info!(
        scanned = scan.scanned,
        indexed = scan.indexed,
        skipped = scan.skipped,
        malformed = scan.malformed,
        resolved = index.resolved(),
        wanted = index.wanted(),
        stopped_early = scan.stopped_early,
        "inspections indexed"
    );
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    fn write_file(name: &str, contents: &str) -> PathBuf {
        let path = temp_path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    const VIOLATIONS_CSV: &str = "\
INSPECTION_ID,PART_NO,PART_NO_SECTION,CHANGE_DATE,OUT_OF_SERVICE_INDICATOR
1,391,11B2,20250615,Y
2,392,2B,20250615,N
3,391,11(B)(2),garbage,Y
4,391,11B2-S,26-DEC-23,N
,391,11B2,20250615,N
";

    #[test]
    fn test_load_violations_screens_and_counts() {
        let path = write_file("elp_loader_violations.csv", VIOLATIONS_CSV);
        let (kept, counts) = load_violations(&path, 2025).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].inspection_id, "1");
        assert!(kept[0].oos);
        assert_eq!(counts.scanned, 5);
        assert_eq!(counts.kept, 1);
        assert_eq!(counts.off_category, 1);
        assert_eq!(counts.bad_date, 1);
        assert_eq!(counts.before_cutoff, 1);
        assert_eq!(counts.missing_id, 1);
        assert_eq!(counts.malformed, 0);
    }

    #[test]
    fn test_load_violations_gzip() {
        let path = temp_path("elp_loader_violations.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(VIOLATIONS_CSV.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let (kept, counts) = load_violations(&path, 2025).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(kept.len(), 1);
        assert_eq!(counts.scanned, 5);
    }

    #[test]
    fn test_load_violations_missing_file() {
        let path = temp_path("elp_loader_does_not_exist.csv");
        assert!(load_violations(&path, 2025).is_err());
    }

    #[test]
    fn test_index_inspections_stops_early() {
        let path = write_file(
            "elp_loader_inspections.csv",
            "\
INSPECTION_ID,REPORT_STATE,INSP_DATE
1,CA,20250615
2,TX,20250616
3,AZ,20250617
",
        );
        let mut index = StateIndex::for_ids(["1".to_string()]);
        let scan = index_inspections(&path, &mut index).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(scan.stopped_early);
        assert_eq!(scan.scanned, 1);
        assert_eq!(scan.indexed, 1);
        assert_eq!(index.state_of("1"), Some("CA"));
    }

    #[test]
    fn test_index_inspections_skips_stateless_rows() {
        let path = write_file(
            "elp_loader_inspections_stateless.csv",
            "\
INSPECTION_ID,REPORT_STATE,INSP_DATE
1,,20250615
2,TX,20250616
",
        );
        let mut index = StateIndex::for_ids(["1".to_string(), "2".to_string()]);
        let scan = index_inspections(&path, &mut index).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(!scan.stopped_early);
        assert_eq!(scan.skipped, 1);
        assert_eq!(scan.indexed, 1);
        assert_eq!(index.state_of("1"), None);
    }

    #[test]
    fn test_malformed_row_is_counted_not_fatal() {
        // Invalid UTF-8 in the middle row; the rows around it still load.
        let path = temp_path("elp_loader_malformed.csv");
        let mut bytes =
            b"INSPECTION_ID,PART_NO,PART_NO_SECTION,CHANGE_DATE,OUT_OF_SERVICE_INDICATOR\n"
                .to_vec();
        bytes.extend_from_slice(b"1,391,11B2,20250615,Y\n");
        bytes.extend_from_slice(b"2,3\xff91,11B2,20250615,N\n");
        bytes.extend_from_slice(b"3,391,11B2,20250702,N\n");
        std::fs::write(&path, &bytes).unwrap();

        let (kept, counts) = load_violations(&path, 2025).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(kept.len(), 2);
        assert_eq!(counts.scanned, 3);
        assert_eq!(counts.malformed, 1);
    }
}
