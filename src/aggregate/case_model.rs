use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::error_classifier::ParsedError;
use crate::events::event_model::RawStatus;

// ============================================================================
// Status
// ============================================================================

/// Normalized outcome of an attempt, a case, or a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Interrupted,
}

impl TestStatus {
    /// Map a runner status. `timedOut` folds into failed; a missing or
    /// unrecognized status counts as skipped.
    pub fn from_raw(raw: Option<RawStatus>) -> Self {
        match raw {
            Some(RawStatus::Passed) => TestStatus::Passed,
            Some(RawStatus::Failed) | Some(RawStatus::TimedOut) => TestStatus::Failed,
            Some(RawStatus::Interrupted) => TestStatus::Interrupted,
            Some(RawStatus::Skipped) | Some(RawStatus::Unknown) | None => TestStatus::Skipped,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
            TestStatus::Interrupted => "interrupted",
        }
    }
}

// ============================================================================
// Steps and attachments
// ============================================================================

/// Display-ready step node. Hook and fixture nodes never appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDetail {
    pub title: String,

    /// Failed if the raw step carried an error, else passed
    pub status: TestStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Omitted when the runner did not report it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    pub steps: Vec<StepDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSummary {
    pub name: String,
    pub content_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Inlined `data:` URI (images only, when screenshots are enabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl AttachmentSummary {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

// ============================================================================
// Attempts and cases
// ============================================================================

/// One execution attempt of a test case. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptDetail {
    /// 0 for the first try, increasing with retries
    pub index: u32,
    pub status: TestStatus,
    /// Milliseconds
    pub duration: u64,
    pub steps: Vec<StepDetail>,
    pub attachments: Vec<AttachmentSummary>,
    pub errors: Vec<ParsedError>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

/// One logical test with all of its attempts folded in.
///
/// `duration` is the cumulative cost of every attempt, while `status`,
/// `steps`, `attachments` and `errors` mirror the attempt with the highest
/// index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDetail {
    pub id: String,
    pub title: String,

    /// Breadcrumb, segments joined with " › "
    pub path: String,
    pub project_name: String,

    /// `file:line`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    pub annotations: BTreeMap<String, String>,

    pub status: TestStatus,
    pub duration: u64,
    pub steps: Vec<StepDetail>,
    pub attachments: Vec<AttachmentSummary>,
    pub errors: Vec<ParsedError>,

    /// Sorted ascending by index
    pub attempts: Vec<AttemptDetail>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl CaseDetail {
    /// The attempt with the highest index.
    pub fn latest_attempt(&self) -> Option<&AttemptDetail> {
        self.attempts.last()
    }

    pub fn retries(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }

    pub fn has_annotation(&self, kind: &str) -> bool {
        self.annotations.contains_key(kind)
    }
}
