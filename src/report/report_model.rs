use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::case_model::CaseDetail;
use crate::cli::config::ResolvedOptions;
use crate::history::store::HistoricalEntry;
use crate::metrics::summary::{AutomationMetrics, SummaryStats};

// ============================================================================
// User-supplied report sections (each field independently optional)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub build: Option<String>,
    pub environment: Option<String>,
    pub project: Option<String>,
    pub release: Option<String>,
    pub ci_link: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScope {
    pub objectives: Option<Vec<String>>,
    pub data_sets: Option<Vec<String>>,
    pub pass_criteria: Option<Vec<String>>,
    pub risks: Option<Vec<String>>,
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSections {
    pub challenges: Option<Vec<String>>,
    pub lessons_learned: Option<Vec<String>>,
    pub recommendations: Option<Vec<String>>,
}

// ============================================================================
// Resolved sections (defaults filled in)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMetadata {
    pub title: String,
    pub author: String,
    pub build: String,
    pub environment: String,
    pub project: String,
    pub release: String,
    pub ci_link: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedScope {
    pub objectives: Vec<String>,
    pub data_sets: Vec<String>,
    pub pass_criteria: Vec<String>,
    pub risks: Vec<String>,
    pub alignment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSections {
    pub challenges: Vec<String>,
    pub lessons_learned: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Browsers, devices and platforms the run covered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub browsers: Vec<String>,
    pub devices: Vec<String>,
    pub operating_systems: Vec<String>,
    /// One row per configured project
    pub config_matrix: Vec<BTreeMap<String, String>>,
}

// ============================================================================
// Report — the single value handed to rendering
// ============================================================================

/// Everything the renderers need, assembled once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub options: ResolvedOptions,
    pub summary: SummaryStats,
    pub scope: ResolvedScope,
    pub metadata: ResolvedMetadata,
    pub environment: EnvironmentInfo,
    pub cases: Vec<CaseDetail>,
    /// Cases whose final status is not passed
    pub failures: Vec<CaseDetail>,
    pub metrics: AutomationMetrics,
    /// Most recent entries only, oldest first
    pub history: Vec<HistoricalEntry>,
    pub sections: ResolvedSections,
    pub warnings: Vec<String>,
    pub reporter_version: String,
}

impl ReportData {
    pub fn all_passed(&self) -> bool {
        self.summary.all_passed()
    }
}
