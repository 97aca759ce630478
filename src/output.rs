//! Dashboard artifact output.

use anyhow::{Context, Result};
use tracing::info;

use crate::pipeline::types::DashboardData;
use std::fs;
use std::path::Path;

/// Writes the artifact as 2-space-indented JSON, the layout the dashboard
/// has always consumed. The file is replaced wholesale on every run.
pub fn write_dashboard(path: &Path, data: &DashboardData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    let bytes = json.len();
    fs::write(path, json).with_context(|| format!("could not write {}", path.display()))?;
    info!(path = %path.display(), bytes, "dashboard data written");
    Ok(())
}

/// Logs the headline numbers of a finished run.
pub fn log_summary(data: &DashboardData) {
    info!(
        total_oos = data.total_oos,
        total_all = data.total_all,
        oos_rate = data.oos_rate,
        months = data.monthly.labels.len(),
        states = data.state_count,
        peak_month = %data.peak_month,
        data_source = %data.data_source,
        "dashboard summary"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;
    use chrono::Utc;
    use serde_json::Value;
    use std::env;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_write_dashboard_round_trips() {
        let path = temp_path("elp_output_write.json");
        let _ = fs::remove_file(&path); // clean up any prior run

        let data = sample::sample_dashboard(Utc::now());
        write_dashboard(&path, &data).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["total_oos"], 527);
        assert_eq!(value["monthly"]["labels"][0], "Jun 25");
        assert_eq!(value["data_source"], "sample");
    }

    #[test]
    fn test_write_dashboard_pretty_prints() {
        let path = temp_path("elp_output_pretty.json");
        let _ = fs::remove_file(&path);

        let data = sample::sample_dashboard(Utc::now());
        write_dashboard(&path, &data).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();

        // 2-space indentation on the first nested line.
        assert!(content.starts_with("{\n  \"last_updated\""));
    }

    #[test]
    fn test_sample_omits_state_monthly() {
        let data = sample::sample_dashboard(Utc::now());
        let value = serde_json::to_value(&data).unwrap();
        assert!(value.get("state_monthly").is_none());
    }

    #[test]
    fn test_log_summary_does_not_panic() {
        let data = sample::sample_dashboard(Utc::now());
        log_summary(&data);
    }
}
