//! CLI entry point for the ELP enforcement tracker.
//!
//! Provides subcommands for converting local FMCSA CSV exports, updating
//! from the Socrata API, and writing the representative sample dataset.

mod infra;
mod services;

use crate::infra::socrata::client::{
    DEFAULT_BASE_URL, INSPECTIONS_DATASET, SocrataClient, VIOLATIONS_DATASET,
};
use crate::services::records_api::RecordsApi;
use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use elp_tracker::pipeline::aggregate::Tally;
use elp_tracker::pipeline::classify;
use elp_tracker::pipeline::join::{self, StateIndex};
use elp_tracker::pipeline::stats;
use elp_tracker::pipeline::types::{ElpViolation, ScanCounts};
use elp_tracker::schema::{InspectionRecord, ViolationRecord};
use elp_tracker::{loader, output, sample};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// A full national extract joins around 45k violations; far fewer usually
/// means a truncated download rather than a quiet month.
const EXPECTED_MIN_MATCHED: u64 = 40_000;

#[derive(Parser)]
#[command(name = "elp_tracker")]
#[command(about = "Builds the ELP enforcement dashboard dataset from FMCSA data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert local FMCSA CSV exports (plain or .gz) into the dashboard JSON
    Convert {
        /// Vehicle Inspections and Violations export
        #[arg(long, default_value = "violations.csv")]
        violations: PathBuf,

        /// Vehicle Inspection File export
        #[arg(long, default_value = "inspections.csv")]
        inspections: PathBuf,

        /// Output JSON path
        #[arg(short, long, default_value = "elp_data.json")]
        output: PathBuf,

        /// Earliest inspection year to include
        #[arg(long, default_value_t = 2025)]
        since_year: i32,
    },
    /// Fetch records from the Socrata API and build the dashboard JSON
    Update {
        /// Output JSON path
        #[arg(short, long, default_value = "elp_data.json")]
        output: PathBuf,

        /// Earliest inspection year to include
        #[arg(long, default_value_t = 2025)]
        since_year: i32,

        /// Rows per API page
        #[arg(long, default_value_t = 50_000)]
        page_size: u64,

        /// Maximum pages to fetch per dataset
        #[arg(long, default_value_t = 5)]
        max_pages: u32,

        /// Socrata resource base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Violations dataset id
        #[arg(long, default_value = VIOLATIONS_DATASET)]
        violations_dataset: String,

        /// Inspections dataset id
        #[arg(long, default_value = INSPECTIONS_DATASET)]
        inspections_dataset: String,
    },
    /// Write the representative sample dataset
    Sample {
        /// Output JSON path
        #[arg(short, long, default_value = "elp_data.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/elp_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("elp_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            violations,
            inspections,
            output,
            since_year,
        } => {
            run_convert(&violations, &inspections, &output, since_year)?;
        }
        Commands::Update {
            output,
            since_year,
            page_size,
            max_pages,
            base_url,
            violations_dataset,
            inspections_dataset,
        } => {
            let app_token = std::env::var("SOCRATA_APP_TOKEN").ok();
            if app_token.is_none() {
                info!("SOCRATA_APP_TOKEN not set, using anonymous (throttled) access");
            }
            let client = SocrataClient::new(
                &base_url,
                &violations_dataset,
                &inspections_dataset,
                since_year,
                app_token,
            )?;
            run_update(&client, &output, since_year, page_size, max_pages).await?;
        }
        Commands::Sample { output } => {
            let data = sample::sample_dashboard(Utc::now());
            output::write_dashboard(&output, &data)?;
            output::log_summary(&data);
        }
    }

    Ok(())
}

/// Builds the dashboard dataset from local CSV exports.
#[tracing::instrument(skip_all, fields(violations = %violations.display(), inspections = %inspections.display()))]
fn run_convert(
    violations: &Path,
    inspections: &Path,
    output_path: &Path,
    since_year: i32,
) -> Result<()> {
    let (kept, _counts) = loader::load_violations(violations, since_year)?;
    if kept.is_empty() {
        bail!("no ELP violations found in {}", violations.display());
    }

    let mut index = StateIndex::for_ids(kept.iter().map(|v| v.inspection_id.clone()));
    loader::index_inspections(inspections, &mut index)?;

    finish(kept, &index, output_path)
}

/// Builds the dashboard dataset from the Socrata API.
#[tracing::instrument(skip(api, output_path))]
async fn run_update(
    api: &dyn RecordsApi,
    output_path: &Path,
    since_year: i32,
    page_size: u64,
    max_pages: u32,
) -> Result<()> {
    let (kept, counts) = fetch_violations(api, since_year, page_size, max_pages).await;
    info!(
        scanned = counts.scanned,
        kept = counts.kept,
        off_category = counts.off_category,
        missing_id = counts.missing_id,
        bad_date = counts.bad_date,
        before_cutoff = counts.before_cutoff,
        "violation pages screened"
    );
    if kept.is_empty() {
        bail!("no ELP violations in the fetched pages");
    }

    let mut index = StateIndex::for_ids(kept.iter().map(|v| v.inspection_id.clone()));
    fetch_inspections(api, &mut index, page_size, max_pages).await;

    finish(kept, &index, output_path)
}

/// Shared tail of both real-data commands: join, aggregate, derive, write.
fn finish(kept: Vec<ElpViolation>, index: &StateIndex, output_path: &Path) -> Result<()> {
    let outcome = join::match_violations(kept, index);
    info!(
        matched = outcome.matched.len(),
        unmatched = outcome.unmatched,
        duplicates = outcome.duplicates,
        "join complete"
    );

    let tally: Tally = outcome.matched.into_iter().collect();
    if tally.is_empty() {
        bail!("no ELP inspections matched, nothing to aggregate");
    }
    if tally.total.all < EXPECTED_MIN_MATCHED {
        warn!(
            total = tally.total.all,
            expected_at_least = EXPECTED_MIN_MATCHED,
            "matched total is well below a full extract"
        );
    }

    let data = stats::build_dashboard(&tally, "real", Utc::now());
    output::write_dashboard(output_path, &data)?;
    output::log_summary(&data);
    Ok(())
}

/// Pages through the violations dataset, screening rows as they arrive.
/// A failed page logs a warning and ends pagination: the run continues
/// with whatever was retrieved.
async fn fetch_violations(
    api: &dyn RecordsApi,
    since_year: i32,
    page_size: u64,
    max_pages: u32,
) -> (Vec<ElpViolation>, ScanCounts) {
    let mut kept = Vec::new();
    let mut counts = ScanCounts::default();
    let mut offset = 0u64;

    for page in 0..max_pages {
        let batch = match api.violations_page(offset, page_size).await {
            Ok(batch) => batch,
            Err(err) => {
                warn!(error = %err, page, "violation page fetch failed, continuing with partial data");
                break;
            }
        };
        let fetched = batch.len() as u64;

        for object in &batch {
            counts.scanned += 1;
            match classify::screen(ViolationRecord::from_json(object), since_year) {
                Ok(violation) => {
                    kept.push(violation);
                    counts.kept += 1;
                }
                Err(reason) => counts.skip(reason),
            }
        }

        info!(page, fetched, kept = counts.kept, "violation page processed");

        if fetched < page_size {
            break;
        }
        offset += page_size;
    }

    (kept, counts)
}

/// Pages through the inspection file, feeding the state index. Stops when
/// every wanted identifier is resolved, the source is exhausted, the page
/// cap is reached, or a page fails.
async fn fetch_inspections(
    api: &dyn RecordsApi,
    index: &mut StateIndex,
    page_size: u64,
    max_pages: u32,
) {
    let mut offset = 0u64;

    for page in 0..max_pages {
        if index.is_complete() {
            info!(resolved = index.resolved(), "all violation ids resolved, stopping early");
            break;
        }

        let batch = match api.inspections_page(offset, page_size).await {
            Ok(batch) => batch,
            Err(err) => {
                warn!(error = %err, page, "inspection page fetch failed, continuing with partial data");
                break;
            }
        };
        let fetched = batch.len() as u64;

        let indexed = index.absorb(batch.iter().filter_map(InspectionRecord::from_json));

        info!(
            page,
            fetched,
            indexed,
            resolved = index.resolved(),
            wanted = index.wanted(),
            "inspection page processed"
        );

        if fetched < page_size {
            break;
        }
        offset += page_size;
    }
}
