use serde::{Deserialize, Serialize};

use crate::aggregate::case_model::{CaseDetail, TestStatus};
use crate::metrics::format::{clamp, percent};

// ============================================================================
// Summary statistics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total: usize,
    pub passed: usize,
    /// Failed and timed-out cases
    pub failed: usize,
    pub skipped: usize,
    pub flaky: usize,
    /// Sum of case durations, retries included
    pub duration_ms: u64,
    /// Earliest known case start (epoch ms)
    pub start_time: i64,
    /// Latest known case end (epoch ms)
    pub end_time: i64,
}

impl SummaryStats {
    pub fn executed(&self) -> usize {
        self.total.saturating_sub(self.skipped)
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Compute summary statistics over the aggregated cases.
///
/// Cases without timestamps are left out of the run window; when no case has
/// one, the window collapses to `now_ms`.
pub fn summarize(cases: &[CaseDetail], now_ms: i64) -> SummaryStats {
    let count = |status: TestStatus| cases.iter().filter(|c| c.status == status).count();

    let start_time = cases.iter().filter_map(|c| c.started_at).min();
    let end_time = cases.iter().filter_map(|c| c.completed_at).max();

    SummaryStats {
        total: cases.len(),
        passed: count(TestStatus::Passed),
        failed: count(TestStatus::Failed),
        skipped: count(TestStatus::Skipped),
        flaky: cases.iter().filter(|c| is_flaky(c)).count(),
        duration_ms: cases.iter().map(|c| c.duration).sum(),
        start_time: start_time.unwrap_or(now_ms),
        end_time: end_time.unwrap_or(now_ms),
    }
}

/// A case is flaky when annotated so, or when its final attempt passed after
/// an earlier attempt failed.
pub fn is_flaky(case: &CaseDetail) -> bool {
    if case.has_annotation("flaky") {
        return true;
    }
    if case.attempts.len() < 2 {
        return false;
    }

    let final_passed = case
        .latest_attempt()
        .is_some_and(|a| a.status == TestStatus::Passed);
    let had_failure = case.attempts.iter().any(|a| a.status == TestStatus::Failed);

    final_passed && had_failure
}

// ============================================================================
// Automation metrics
// ============================================================================

/// Quality indicators shown on the report.
///
/// `maintainability_index` and `reusability_score` are heuristic scores that
/// only penalize failures and reward passes; they are not measured properties
/// of the suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationMetrics {
    /// Executed / total, percent
    pub coverage_percent: f64,
    /// Passed / executed, percent
    pub reliability_score: f64,
    /// `100 - 5 * failed`, saturated to [40, 100]
    pub maintainability_index: f64,
    /// `70 + 2 * passed - 3 * failed`, saturated to [40, 100]
    pub reusability_score: f64,
}

pub fn derive_metrics(summary: &SummaryStats) -> AutomationMetrics {
    let total = summary.total as f64;
    let executed = summary.executed() as f64;
    let passed = summary.passed as f64;
    let failed = summary.failed as f64;

    AutomationMetrics {
        coverage_percent: clamp(percent(executed, total), 0.0, 100.0),
        reliability_score: clamp(percent(passed, executed), 0.0, 100.0),
        maintainability_index: clamp(100.0 - failed * 5.0, 40.0, 100.0),
        reusability_score: clamp(70.0 + passed * 2.0 - failed * 3.0, 40.0, 100.0),
    }
}
