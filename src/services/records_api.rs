//! Trait and types for paged access to the FMCSA enforcement datasets.

use anyhow::Result;
use serde_json::{Map, Value};

/// One page of raw rows as served by the source. Rows stay untyped at this
/// boundary; the schema adapters canonicalize them.
pub type RawPage = Vec<Map<String, Value>>;

/// Abstraction over a paginated records source (e.g. the Socrata API).
///
/// Pages are requested by offset; a page shorter than the requested limit
/// means the source is exhausted. Implementations surface transport
/// failures as errors and leave retry and stop policy to the caller.
#[async_trait::async_trait]
pub trait RecordsApi {
    /// Returns one page of violation rows.
    async fn violations_page(&self, offset: u64, limit: u64) -> Result<RawPage>;

    /// Returns one page of vehicle inspection rows.
    async fn inspections_page(&self, offset: u64, limit: u64) -> Result<RawPage>;
}
