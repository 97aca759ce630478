//! Socrata implementation of [`RecordsApi`] for data.transportation.gov.

use anyhow::{Context, Result};
use reqwest::Url;
use std::time::Duration;

use crate::services::records_api::{RawPage, RecordsApi};
use elp_tracker::fetch::{BasicClient, HttpClient, auth::AppToken, fetch_objects};

/// data.transportation.gov resource endpoint base.
pub const DEFAULT_BASE_URL: &str = "https://data.transportation.gov/resource";

/// Vehicle Inspections and Violations dataset (per-violation rows).
pub const VIOLATIONS_DATASET: &str = "876r-jsdb";

/// Vehicle Inspection File dataset (per-inspection rows, carries the state).
pub const INSPECTIONS_DATASET: &str = "fx4q-ay7w";

// Server-side column projections keep page payloads small.
const VIOLATION_FIELDS: &str =
    "inspection_id,part_no,part_no_section,change_date,out_of_service_indicator";
const INSPECTION_FIELDS: &str = "inspection_id,report_state,insp_date";

/// Paged client for the two FMCSA datasets on Socrata.
pub struct SocrataClient {
    http: Box<dyn HttpClient>,
    base_url: String,
    violations_dataset: String,
    inspections_dataset: String,
    since_year: i32,
}

impl SocrataClient {
    /// `app_token` raises the anonymous throttling limits when present;
    /// the `update` command reads it from `SOCRATA_APP_TOKEN`.
    pub fn new(
        base_url: &str,
        violations_dataset: &str,
        inspections_dataset: &str,
        since_year: i32,
        app_token: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let http: Box<dyn HttpClient> = match app_token {
            Some(token) => Box::new(AppToken::new(BasicClient::from(client), token)),
            None => Box::new(BasicClient::from(client)),
        };

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            violations_dataset: violations_dataset.to_string(),
            inspections_dataset: inspections_dataset.to_string(),
            since_year,
        })
    }

    fn page_url(&self, dataset: &str, params: &[(&str, String)]) -> Result<Url> {
        let endpoint = format!("{}/{}.json", self.base_url, dataset);
        Url::parse_with_params(&endpoint, params)
            .with_context(|| format!("invalid Socrata URL for dataset {dataset}"))
    }
}

#[async_trait::async_trait]
impl RecordsApi for SocrataClient {
    async fn violations_page(&self, offset: u64, limit: u64) -> Result<RawPage> {
        // change_date is compact YYYYMMDD-prefixed text, so a lexicographic
        // bound doubles as a date bound. Screening re-applies the cutoff to
        // whatever comes back.
        let url = self.page_url(
            &self.violations_dataset,
            &[
                ("$select", VIOLATION_FIELDS.to_string()),
                ("$where", format!("change_date >= '{}0101'", self.since_year)),
                ("$order", "change_date DESC".to_string()),
                ("$limit", limit.to_string()),
                ("$offset", offset.to_string()),
            ],
        )?;
        fetch_objects(self.http.as_ref(), url).await
    }

    async fn inspections_page(&self, offset: u64, limit: u64) -> Result<RawPage> {
        // Ascending date order makes the index's most-recent-wins policy
        // line up with the chronologically latest inspection row.
        let url = self.page_url(
            &self.inspections_dataset,
            &[
                ("$select", INSPECTION_FIELDS.to_string()),
                ("$order", "insp_date".to_string()),
                ("$limit", limit.to_string()),
                ("$offset", offset.to_string()),
            ],
        )?;
        fetch_objects(self.http.as_ref(), url).await
    }
}
