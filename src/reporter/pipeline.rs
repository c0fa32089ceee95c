use std::path::PathBuf;

use serde_json::Value;

use tracing::{info, warn};

use crate::aggregate::aggregator::CaseAggregator;
use crate::cli::config::ResolvedOptions;
use crate::error::ReportError;
use crate::events::event_model::{RawTestEvent, RunConfig, RunDocument};
use crate::history::store::{
    HistoricalEntry, append_history, load_history_records, parse_entries,
};
use crate::render::pdf::PdfRenderer;
use crate::report::assembler::assemble;
use crate::report::html::HtmlRenderer;
use crate::report::report_model::ReportData;

/// Where the artifacts of a finished run ended up.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: ReportData,
    pub pdf_path: PathBuf,
    pub html_path: Option<PathBuf>,
    pub history_path: Option<PathBuf>,
}

/// Drives one run: begin → one call per finished attempt → end.
pub struct Reporter {
    options: ResolvedOptions,
    config: Option<RunConfig>,
    aggregator: CaseAggregator,
    warnings: Vec<String>,
}

impl Reporter {
    pub fn new(options: ResolvedOptions) -> Self {
        let aggregator = CaseAggregator::new(
            options.include_screenshots,
            options.bug_tracker_base_url.clone(),
        );
        Self {
            options,
            config: None,
            aggregator,
            warnings: Vec::new(),
        }
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// Record the runner configuration snapshot.
    pub fn on_begin(&mut self, config: Option<RunConfig>) {
        self.config = config;
    }

    /// Fold one finished attempt.
    pub fn on_test_end(&mut self, event: &RawTestEvent) {
        self.aggregator.observe(event);
    }

    /// Assemble the report without touching the filesystem (history aside).
    ///
    /// Also returns the raw history records, which are written back untouched.
    pub fn build_report(self) -> (ReportData, Vec<Value>) {
        let history_path = self.options.historical_data_path.clone();
        let records = load_history_records(history_path.as_deref());
        let history = parse_entries(&records);
        let cases = self.aggregator.finish();
        let report = assemble(
            cases,
            self.config.as_ref(),
            &self.options,
            self.warnings,
            &history,
        );
        (report, records)
    }

    /// Finish the run: assemble, render, write artifacts, append history.
    ///
    /// Failing to create the output directory, to render, or to write the PDF
    /// or HTML aborts the run. A history write failure only logs a warning.
    pub fn on_end(
        self,
        html_renderer: &HtmlRenderer,
        pdf_renderer: &dyn PdfRenderer,
    ) -> Result<RunOutcome, ReportError> {
        let (report, history) = self.build_report();
        let options = &report.options;

        std::fs::create_dir_all(&options.output_dir).map_err(|e| ReportError::CreateOutputDir {
            path: options.output_dir.clone(),
            source: e,
        })?;

        let html = html_renderer.render(&report);
        let pdf_path = options.pdf_path();
        pdf_renderer.render(&html, &pdf_path, &report.metadata)?;

        let html_path = if options.include_html {
            let path = options.html_path();
            std::fs::write(&path, &html).map_err(|e| ReportError::WriteArtifact {
                path: path.clone(),
                source: e,
            })?;
            info!(html = %path.display(), "HTML written");
            Some(path)
        } else {
            None
        };

        let history_path = options.historical_data_path.clone();
        if history_path.is_some() {
            let entry = HistoricalEntry::from_report(&report.summary, &report.metrics);
            if let Err(e) = append_history(history_path.as_deref(), &history, &entry) {
                warn!(error = %e, "history not updated");
            }
        }

        info!(pdf = %pdf_path.display(), "report generated");
        Ok(RunOutcome {
            report,
            pdf_path,
            html_path,
            history_path,
        })
    }
}

/// Run a whole document through the reporter lifecycle.
pub fn run_document(
    document: &RunDocument,
    options: ResolvedOptions,
    html_renderer: &HtmlRenderer,
    pdf_renderer: &dyn PdfRenderer,
) -> Result<RunOutcome, ReportError> {
    let mut reporter = Reporter::new(options);
    reporter.on_begin(document.config.clone());
    for event in &document.events {
        reporter.on_test_end(event);
    }
    reporter.on_end(html_renderer, pdf_renderer)
}
