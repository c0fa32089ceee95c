use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::events::event_model::RawError;

// ============================================================================
// Failure taxonomy
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureCategory {
    Functional,
    Compatibility,
    Performance,
    Infrastructure,
    Flaky,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FailureCategory {
    pub fn label(&self) -> &'static str {
        match self {
            FailureCategory::Functional => "functional",
            FailureCategory::Compatibility => "compatibility",
            FailureCategory::Performance => "performance",
            FailureCategory::Infrastructure => "infrastructure",
            FailureCategory::Flaky => "flaky",
            FailureCategory::Unknown => "unknown",
        }
    }
}

impl FailureSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            FailureSeverity::Low => "low",
            FailureSeverity::Medium => "medium",
            FailureSeverity::High => "high",
            FailureSeverity::Critical => "critical",
        }
    }
}

/// A runner error annotated with its heuristic classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedError {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    pub category: FailureCategory,
    pub severity: FailureSeverity,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_link: Option<String>,
}

// ============================================================================
// Patterns — checked top to bottom, first match wins
// ============================================================================

fn pattern(source: &str) -> Regex {
    Regex::new(&format!("(?i){source}")).unwrap_or_else(|e| panic!("invalid pattern {source}: {e}"))
}

static CATEGORY_RULES: Lazy<Vec<(Regex, FailureCategory)>> = Lazy::new(|| {
    vec![
        (pattern("timeout"), FailureCategory::Performance),
        (pattern("not found|selector"), FailureCategory::Functional),
        (pattern("browser|protocol|websocket"), FailureCategory::Compatibility),
        // "timeout" can never reach this rule; performance is checked first.
        (pattern("network|fetch|timeout|ECONN"), FailureCategory::Infrastructure),
    ]
});

static SEVERITY_RULES: Lazy<Vec<(Regex, FailureSeverity)>> = Lazy::new(|| {
    vec![
        (pattern("critical|crash|data loss"), FailureSeverity::Critical),
        (pattern("timeout|not found|detached"), FailureSeverity::High),
        (pattern("flaky|retry"), FailureSeverity::Low),
    ]
});

static ISSUE_TOKEN: Lazy<Regex> = Lazy::new(|| pattern(r"#(\d+)"));

const UNKNOWN_MESSAGE: &str = "Unknown error";

// ============================================================================
// Classification
// ============================================================================

/// Classify one runner error.
///
/// `bug_tracker_base_url` enables issue links for messages that mention a
/// `#<digits>` token.
pub fn classify(error: &RawError, bug_tracker_base_url: Option<&str>) -> ParsedError {
    let message = error.message.as_deref().filter(|m| !m.is_empty());

    ParsedError {
        message: message.unwrap_or(UNKNOWN_MESSAGE).to_string(),
        stack: error.stack.clone(),
        category: message.map(categorize).unwrap_or(FailureCategory::Unknown),
        severity: message.map(severity).unwrap_or(FailureSeverity::Medium),
        issue_link: message.and_then(|m| issue_link(m, bug_tracker_base_url?)),
    }
}

pub fn categorize(message: &str) -> FailureCategory {
    CATEGORY_RULES
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map(|(_, category)| *category)
        .unwrap_or(FailureCategory::Unknown)
}

pub fn severity(message: &str) -> FailureSeverity {
    SEVERITY_RULES
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map(|(_, severity)| *severity)
        .unwrap_or(FailureSeverity::Medium)
}

/// Build `<base>/<digits>` from the first `#<digits>` token of the message.
pub fn issue_link(message: &str, base_url: &str) -> Option<String> {
    if base_url.is_empty() {
        return None;
    }
    let digits = ISSUE_TOKEN.captures(message)?.get(1)?.as_str();
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    Some(format!("{}/{}", base, digits))
}
