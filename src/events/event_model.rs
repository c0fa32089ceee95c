use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Run document — what the host test runner hands over
// ============================================================================

/// A finished run as exported by the host test runner: one configuration
/// snapshot plus one event per test attempt, in emission order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDocument {
    #[serde(default)]
    pub config: Option<RunConfig>,

    #[serde(default)]
    pub events: Vec<RawTestEvent>,
}

/// Runner configuration snapshot taken at run start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "use")]
    pub use_options: UseOptions,
}

/// The subset of per-project `use` options the report cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

// ============================================================================
// Per-attempt event
// ============================================================================

/// Status string as reported by the runner, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RawStatus {
    Passed,
    Failed,
    TimedOut,
    Skipped,
    Interrupted,
    /// Any status this version does not know; counted as skipped
    #[serde(other)]
    Unknown,
}

/// One test-attempt completion event.
///
/// Every field is optional on the wire; absent values take the defaults
/// documented on each field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTestEvent {
    /// Runner-assigned stable test id (shared by all retries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Ordered title segments from the root suite down to the test
    #[serde(default)]
    pub title_path: Vec<String>,

    /// Test title; defaults to the last non-empty title segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Project name; defaults to "default"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    /// Retry index; 0 for the first attempt
    #[serde(default)]
    pub retry: u32,

    /// Missing status is treated as skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RawStatus>,

    /// Milliseconds
    #[serde(default)]
    pub duration: u64,

    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,

    #[serde(default)]
    pub steps: Vec<RawStep>,

    #[serde(default)]
    pub attachments: Vec<RawAttachment>,

    #[serde(default)]
    pub errors: Vec<RawError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A node of the raw step forest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStep {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    /// Any error payload; only its presence matters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    #[serde(default)]
    pub steps: Vec<RawStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl RawError {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            stack: None,
        }
    }
}

impl RawTestEvent {
    /// Title to display: explicit title, else the last non-empty title segment.
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .or_else(|| {
                self.title_path
                    .iter()
                    .rev()
                    .find(|segment| !segment.is_empty())
                    .cloned()
            })
            .unwrap_or_default()
    }

    pub fn project(&self) -> &str {
        self.project_name.as_deref().unwrap_or("default")
    }
}
