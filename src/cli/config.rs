use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::report::report_model::{CustomSections, ReportMetadata, TestScope};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "run-report",
    version,
    about = "Aggregate browser test results into a PDF report with run history"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: run-report.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the report from a run document and write PDF/HTML/history
    Generate {
        /// Path to the run document (JSON with config snapshot and attempt events)
        #[arg(long)]
        events: String,

        #[command(flatten)]
        overrides: OptionOverrides,
    },

    /// Print the stored run history
    History {
        /// History file (default: the configured history path)
        #[arg(long)]
        path: Option<String>,

        /// Show every stored entry instead of the display window
        #[arg(long)]
        all: bool,
    },
}

/// Command-line overrides. Anything left unset falls through to the config
/// file, then to the built-in defaults.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct OptionOverrides {
    /// Output directory for the PDF and HTML artifacts
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Output file name (".pdf" is appended when missing)
    #[arg(long)]
    pub file_name: Option<String>,

    /// Visual theme
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    /// Which sections to render
    #[arg(long, value_enum)]
    pub report_type: Option<ReportMode>,

    /// History file path
    #[arg(long)]
    pub history: Option<String>,

    /// Disable history entirely
    #[arg(long, conflicts_with = "history")]
    pub no_history: bool,

    /// Do not inline screenshots
    #[arg(long)]
    pub no_screenshots: bool,

    /// Do not keep the intermediate HTML file
    #[arg(long)]
    pub no_html: bool,

    /// Skip screenshots, HTML and history
    #[arg(long)]
    pub fast: bool,

    /// Base URL for issue links (e.g. https://tracker.example.com/issues)
    #[arg(long)]
    pub bug_tracker_url: Option<String>,

    /// Label for the trend section
    #[arg(long)]
    pub trend_label: Option<String>,

    /// Node.js binary used to drive the PDF renderer
    #[arg(long)]
    pub node_binary: Option<String>,
}

// ============================================================================
// Option enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    Summary,
    Execution,
    Defect,
    #[default]
    Full,
}

impl ReportMode {
    pub fn shows_cases(&self) -> bool {
        matches!(self, ReportMode::Execution | ReportMode::Full)
    }

    pub fn shows_defects(&self) -> bool {
        matches!(self, ReportMode::Defect | ReportMode::Full)
    }
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

pub const DEFAULT_CONFIG_FILE: &str = "run-report.yaml";
pub const DEFAULT_OUTPUT_DIR: &str = "playwright-report/pdf";
pub const DEFAULT_FILE_NAME: &str = "test-report.pdf";
pub const DEFAULT_HISTORY_PATH: &str = "playwright-report/pdf/history.json";
pub const DEFAULT_TREND_LABEL: &str = "Overall";
pub const DEFAULT_NODE_BINARY: &str = "node";

/// Reporter options as written by the user. Every field is optional.
///
/// `historical_data_path` keeps "not provided" (`None`) apart from
/// "explicitly cleared" (`Some(None)`, written as `null` or `""`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReporterOptions {
    pub output_dir: Option<String>,
    pub file_name: Option<String>,
    pub theme: Option<Theme>,
    pub include_screenshots: Option<bool>,
    pub include_html: Option<bool>,

    #[serde(default, deserialize_with = "explicit_option")]
    pub historical_data_path: Option<Option<String>>,

    pub report_type: Option<ReportMode>,

    #[serde(default)]
    pub metadata: ReportMetadata,
    #[serde(default)]
    pub scope: TestScope,
    #[serde(default)]
    pub custom_sections: CustomSections,

    pub trend_label: Option<String>,
    pub bug_tracker_base_url: Option<String>,

    #[serde(default)]
    pub fast_mode: bool,

    pub node_binary: Option<String>,
}

/// Present-but-null becomes `Some(None)`; an absent key stays `None` through
/// `#[serde(default)]`.
fn explicit_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Option::<String>::deserialize(deserializer)?))
}

/// Options with every default applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOptions {
    pub output_dir: PathBuf,
    pub file_name: String,
    pub theme: Theme,
    pub include_screenshots: bool,
    pub include_html: bool,
    /// `None` disables history
    pub historical_data_path: Option<PathBuf>,
    pub report_type: ReportMode,
    pub metadata: ReportMetadata,
    pub scope: TestScope,
    pub custom_sections: CustomSections,
    pub trend_label: String,
    pub bug_tracker_base_url: Option<String>,
    pub fast_mode: bool,
    pub node_binary: String,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        resolve_options(ReporterOptions::default())
    }
}

impl ResolvedOptions {
    pub fn pdf_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }

    /// Sibling of the PDF with an `.html` extension.
    pub fn html_path(&self) -> PathBuf {
        self.pdf_path().with_extension("html")
    }
}

/// Apply the default table to user options.
pub fn resolve_options(options: ReporterOptions) -> ResolvedOptions {
    let output_dir = options
        .output_dir
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());

    let historical_data_path = match options.historical_data_path {
        None => Some(DEFAULT_HISTORY_PATH.to_string()),
        Some(explicit) => explicit.filter(|p| !p.is_empty()),
    };

    let mut resolved = ResolvedOptions {
        output_dir: PathBuf::from(output_dir),
        file_name: normalize_file_name(options.file_name.as_deref()),
        theme: options.theme.unwrap_or_default(),
        include_screenshots: options.include_screenshots.unwrap_or(true),
        include_html: options.include_html.unwrap_or(true),
        historical_data_path: historical_data_path.map(PathBuf::from),
        report_type: options.report_type.unwrap_or_default(),
        metadata: options.metadata,
        scope: options.scope,
        custom_sections: options.custom_sections,
        trend_label: options
            .trend_label
            .unwrap_or_else(|| DEFAULT_TREND_LABEL.to_string()),
        bug_tracker_base_url: options.bug_tracker_base_url.filter(|u| !u.is_empty()),
        fast_mode: options.fast_mode,
        node_binary: options
            .node_binary
            .unwrap_or_else(|| DEFAULT_NODE_BINARY.to_string()),
    };

    if resolved.fast_mode {
        resolved.include_screenshots = false;
        resolved.include_html = false;
        resolved.historical_data_path = None;
    }

    resolved
}

/// Force a `.pdf` suffix (case-insensitive check).
pub fn normalize_file_name(name: Option<&str>) -> String {
    let name = name.filter(|n| !n.is_empty()).unwrap_or(DEFAULT_FILE_NAME);
    if name.to_lowercase().ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{}.pdf", name)
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load options from a YAML file. Returns defaults if the file is missing or
/// malformed.
pub fn load_config(path: Option<&str>) -> ReporterOptions {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "ignoring malformed config file");
            ReporterOptions::default()
        }),
        Err(_) => ReporterOptions::default(),
    }
}

pub fn parse_config(content: &str) -> Result<ReporterOptions, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

// ============================================================================
// Merge CLI overrides onto file options
// ============================================================================

/// CLI > config file. Flags only override when given.
pub fn apply_overrides(mut options: ReporterOptions, overrides: &OptionOverrides) -> ReporterOptions {
    if let Some(dir) = &overrides.output_dir {
        options.output_dir = Some(dir.clone());
    }
    if let Some(name) = &overrides.file_name {
        options.file_name = Some(name.clone());
    }
    if overrides.theme.is_some() {
        options.theme = overrides.theme;
    }
    if overrides.report_type.is_some() {
        options.report_type = overrides.report_type;
    }
    if let Some(path) = &overrides.history {
        options.historical_data_path = Some(Some(path.clone()));
    }
    if overrides.no_history {
        options.historical_data_path = Some(None);
    }
    if overrides.no_screenshots {
        options.include_screenshots = Some(false);
    }
    if overrides.no_html {
        options.include_html = Some(false);
    }
    if overrides.fast {
        options.fast_mode = true;
    }
    if let Some(url) = &overrides.bug_tracker_url {
        options.bug_tracker_base_url = Some(url.clone());
    }
    if let Some(label) = &overrides.trend_label {
        options.trend_label = Some(label.clone());
    }
    if let Some(node) = &overrides.node_binary {
        options.node_binary = Some(node.clone());
    }
    options
}
