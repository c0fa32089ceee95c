use std::path::Path;

use tracing::info;

use crate::cli::config::{OptionOverrides, ReporterOptions, apply_overrides, resolve_options};
use crate::error::ReportError;
use crate::events::loader::load_run_document;
use crate::history::store::{display_window, load_history};
use crate::render::pdf::NodePdfRenderer;
use crate::report::console::{format_console_report, format_history};
use crate::report::html::{AssetCache, HtmlRenderer};
use crate::reporter::pipeline::{RunOutcome, run_document};

// ============================================================================
// generate subcommand
// ============================================================================

/// Build and write the report. Returns the outcome so the caller can decide
/// the exit code.
pub fn cmd_generate(
    events_path: &str,
    file_options: ReporterOptions,
    overrides: &OptionOverrides,
) -> Result<RunOutcome, ReportError> {
    let options = resolve_options(apply_overrides(file_options, overrides));
    info!(
        events = events_path,
        output_dir = %options.output_dir.display(),
        fast_mode = options.fast_mode,
        "generating report"
    );

    let document = load_run_document(Path::new(events_path))?;
    let html_renderer = HtmlRenderer::new(AssetCache::new(
        std::env::var_os("RUN_REPORT_CHART_BUNDLE").map(Into::into),
    ));
    let pdf_renderer = NodePdfRenderer::new(options.node_binary.clone());

    let outcome = run_document(&document, options, &html_renderer, &pdf_renderer)?;

    print!("{}", format_console_report(&outcome.report));
    println!("PDF generated at {}", outcome.pdf_path.display());
    if let Some(html) = &outcome.html_path {
        println!("HTML kept at {}", html.display());
    }

    Ok(outcome)
}

// ============================================================================
// history subcommand
// ============================================================================

pub fn cmd_history(path: Option<&str>, all: bool, file_options: ReporterOptions) {
    let history_path = match path {
        Some(p) => Some(p.into()),
        None => resolve_options(file_options).historical_data_path,
    };

    let Some(history_path) = history_path else {
        println!("History is disabled.");
        return;
    };

    let entries = load_history(Some(&history_path));
    let shown = if all { entries } else { display_window(&entries) };
    print!("{}", format_history(&shown));
}
