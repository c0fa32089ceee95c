use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ReportError;
use crate::metrics::format::iso_timestamp;
use crate::metrics::summary::{AutomationMetrics, SummaryStats};

/// Number of past runs surfaced on the report.
pub const HISTORY_WINDOW: usize = 20;

/// One past run's summary. Field names follow the on-disk camelCase format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalEntry {
    /// RFC 3339
    pub timestamp: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub coverage_percent: f64,
    pub reliability_score: f64,
}

impl HistoricalEntry {
    /// Entry for the run that just finished.
    pub fn from_report(summary: &SummaryStats, metrics: &AutomationMetrics) -> Self {
        Self {
            timestamp: iso_timestamp(Utc::now()),
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            skipped: summary.skipped,
            duration_ms: summary.duration_ms,
            coverage_percent: metrics.coverage_percent,
            reliability_score: metrics.reliability_score,
        }
    }
}

/// Read the raw history records.
///
/// History is best-effort: no path, a missing or unreadable file, and content
/// that is not a JSON array all yield an empty history. Array elements are
/// kept as-is so that rewriting the file never drops entries this version
/// cannot read.
pub fn load_history_records(path: Option<&Path>) -> Vec<Value> {
    let Some(path) = path else {
        return Vec::new();
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable history");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(records)) => {
            debug!(path = %path.display(), entries = records.len(), "loaded history");
            records
        }
        Ok(_) => {
            warn!(path = %path.display(), "discarding history that is not an array");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "discarding malformed history");
            Vec::new()
        }
    }
}

/// Typed view of the records. Entries that do not match the current shape
/// are skipped for display only.
pub fn parse_entries(records: &[Value]) -> Vec<HistoricalEntry> {
    records
        .iter()
        .enumerate()
        .filter_map(|(position, record)| {
            match HistoricalEntry::deserialize(record) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(position, error = %e, "skipping unreadable history entry");
                    None
                }
            }
        })
        .collect()
}

/// Read the history file as typed entries.
pub fn load_history(path: Option<&Path>) -> Vec<HistoricalEntry> {
    parse_entries(&load_history_records(path))
}

/// Overwrite the history file with every prior record plus `entry`.
///
/// Read-then-overwrite, single writer per run. No path means history is
/// disabled and nothing is written.
pub fn append_history(
    path: Option<&Path>,
    prior: &[Value],
    entry: &HistoricalEntry,
) -> Result<(), ReportError> {
    let Some(path) = path else {
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::CreateOutputDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut records = prior.to_vec();
    records.push(serde_json::to_value(entry).map_err(|e| ReportError::JsonSerialize {
        context: "history entry".into(),
        source: e,
    })?);

    let json = serde_json::to_string_pretty(&records).map_err(|e| ReportError::JsonSerialize {
        context: "history".into(),
        source: e,
    })?;

    std::fs::write(path, json).map_err(|e| ReportError::WriteArtifact {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(path = %path.display(), entries = records.len(), "history written");
    Ok(())
}

/// The most recent entries, oldest first.
pub fn display_window(entries: &[HistoricalEntry]) -> Vec<HistoricalEntry> {
    let start = entries.len().saturating_sub(HISTORY_WINDOW);
    entries[start..].to_vec()
}
