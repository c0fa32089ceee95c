use std::cell::RefCell;
use std::path::{Path, PathBuf};

use run_report::cli::config::{ReporterOptions, ResolvedOptions, resolve_options};
use run_report::error::ReportError;
use run_report::events::event_model::{RawStatus, RunDocument};
use run_report::events::loader::{load_run_document, parse_run_document};
use run_report::history::store::{load_history, load_history_records};
use run_report::render::pdf::PdfRenderer;
use run_report::report::html::HtmlRenderer;
use run_report::report::report_model::ResolvedMetadata;
use run_report::reporter::pipeline::{Reporter, run_document};

use crate::common::builders::{event, with_errors};

mod common;

/// Writes the HTML bytes where the PDF should go and remembers the call.
#[derive(Default)]
struct RecordingRenderer {
    calls: RefCell<Vec<(PathBuf, String)>>,
}

impl PdfRenderer for RecordingRenderer {
    fn render(
        &self,
        html: &str,
        pdf_path: &Path,
        metadata: &ResolvedMetadata,
    ) -> Result<(), ReportError> {
        std::fs::write(pdf_path, html).map_err(|e| ReportError::WriteArtifact {
            path: pdf_path.to_path_buf(),
            source: e,
        })?;
        self.calls
            .borrow_mut()
            .push((pdf_path.to_path_buf(), metadata.title.clone()));
        Ok(())
    }
}

struct FailingRenderer;

impl PdfRenderer for FailingRenderer {
    fn render(&self, _: &str, _: &Path, _: &ResolvedMetadata) -> Result<(), ReportError> {
        Err(ReportError::RendererIo("browser unavailable".into()))
    }
}

fn options_in(dir: &Path) -> ResolvedOptions {
    let mut options = ResolvedOptions::default();
    options.output_dir = dir.join("out");
    options.historical_data_path = Some(dir.join("out").join("history.json"));
    options
}

fn document() -> RunDocument {
    RunDocument {
        config: None,
        events: vec![
            event("logs in", 0, RawStatus::Passed, 1_200),
            with_errors(event("checks out", 0, RawStatus::Failed, 900), &["Timeout"]),
        ],
    }
}

// ============================================================================
// Full lifecycle
// ============================================================================

#[test]
fn writes_pdf_html_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let options = options_in(dir.path());
    let renderer = RecordingRenderer::default();

    let outcome =
        run_document(&document(), options.clone(), &HtmlRenderer::default(), &renderer).unwrap();

    assert_eq!(outcome.pdf_path, options.pdf_path());
    assert!(outcome.pdf_path.exists());
    assert_eq!(renderer.calls.borrow().len(), 1);
    assert_eq!(renderer.calls.borrow()[0].1, "Playwright Automation Report");

    let html_path = outcome.html_path.clone().unwrap();
    assert_eq!(html_path, options.html_path());
    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("<h2>Defects</h2>"));

    let history = load_history(outcome.history_path.as_deref());
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].total, 2);
    assert_eq!(history[0].failed, 1);

    assert_eq!(outcome.report.summary.total, 2);
    assert!(!outcome.report.all_passed());
}

#[test]
fn history_accumulates_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = RecordingRenderer::default();

    for _ in 0..3 {
        run_document(&document(), options_in(dir.path()), &HtmlRenderer::default(), &renderer)
            .unwrap();
    }

    let outcome =
        run_document(&document(), options_in(dir.path()), &HtmlRenderer::default(), &renderer)
            .unwrap();
    assert_eq!(outcome.report.history.len(), 3, "report shows prior runs only");
    assert_eq!(load_history(outcome.history_path.as_deref()).len(), 4);
}

#[test]
fn run_keeps_history_entries_it_cannot_read() {
    let dir = tempfile::tempdir().unwrap();
    let options = options_in(dir.path());
    let history_path = options.historical_data_path.clone().unwrap();
    std::fs::create_dir_all(history_path.parent().unwrap()).unwrap();
    std::fs::write(
        &history_path,
        r#"[
          {"timestamp":"2026-01-01T00:00:00Z","total":1,"passed":1,"failed":0,"skipped":0,
           "durationMs":10,"coveragePercent":100.0,"reliabilityScore":100.0},
          {"timestamp":"2026-01-02T00:00:00Z","total":1,"passed":1,"failed":0,"skipped":0,
           "durationMs":10},
          {"timestamp":"2026-01-03T00:00:00Z","total":1,"passed":1,"failed":0,"skipped":0,
           "durationMs":10,"coveragePercent":100.0,"reliabilityScore":100.0}
        ]"#,
    )
    .unwrap();

    let outcome = run_document(
        &document(),
        options,
        &HtmlRenderer::default(),
        &RecordingRenderer::default(),
    )
    .unwrap();

    assert_eq!(outcome.report.history.len(), 2, "unreadable entry skipped for display");
    let on_disk = load_history_records(Some(&history_path));
    assert_eq!(on_disk.len(), 4, "prior records kept, one appended");
    assert!(on_disk[1].get("coveragePercent").is_none());
    assert_eq!(on_disk[3]["total"], 2);
}

#[test]
fn disabled_html_and_history_write_only_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = options_in(dir.path());
    options.include_html = false;
    options.historical_data_path = None;

    let outcome = run_document(
        &document(),
        options.clone(),
        &HtmlRenderer::default(),
        &RecordingRenderer::default(),
    )
    .unwrap();

    assert!(outcome.html_path.is_none());
    assert!(outcome.history_path.is_none());
    assert!(!options.html_path().exists());
    assert!(!dir.path().join("out").join("history.json").exists());
    assert!(outcome.pdf_path.exists());
}

#[test]
fn fast_mode_skips_html_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut file_options = ReporterOptions::default();
    file_options.output_dir = Some(dir.path().join("out").to_string_lossy().into_owned());
    file_options.fast_mode = true;
    let options = resolve_options(file_options);

    let outcome = run_document(
        &document(),
        options,
        &HtmlRenderer::default(),
        &RecordingRenderer::default(),
    )
    .unwrap();
    assert!(outcome.html_path.is_none());
    assert!(outcome.history_path.is_none());
}

#[test]
fn renderer_failure_aborts_and_skips_history() {
    let dir = tempfile::tempdir().unwrap();
    let options = options_in(dir.path());
    let history_path = options.historical_data_path.clone().unwrap();

    let err = run_document(&document(), options, &HtmlRenderer::default(), &FailingRenderer)
        .unwrap_err();
    assert!(matches!(err, ReportError::RendererIo(_)));
    assert!(!history_path.exists());
}

#[test]
fn history_write_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "a file, not a directory").unwrap();

    let mut options = options_in(dir.path());
    options.historical_data_path = Some(blocker.join("history.json"));

    let outcome = run_document(
        &document(),
        options,
        &HtmlRenderer::default(),
        &RecordingRenderer::default(),
    );
    assert!(outcome.is_ok());
}

#[test]
fn empty_run_still_produces_report() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = run_document(
        &RunDocument::default(),
        options_in(dir.path()),
        &HtmlRenderer::default(),
        &RecordingRenderer::default(),
    )
    .unwrap();
    assert_eq!(outcome.report.summary.total, 0);
    assert_eq!(outcome.report.warnings.len(), 1);
    assert!(outcome.pdf_path.exists());
}

// ============================================================================
// Incremental reporter API
// ============================================================================

#[test]
fn reporter_accepts_events_one_by_one() {
    let dir = tempfile::tempdir().unwrap();
    let mut reporter = Reporter::new(options_in(dir.path()));
    reporter.on_begin(None);
    reporter.on_test_end(&event("a", 0, RawStatus::Failed, 100));
    reporter.on_test_end(&event("a", 1, RawStatus::Passed, 100));
    assert_eq!(reporter.options().output_dir, dir.path().join("out"));

    let (report, history) = reporter.build_report();
    assert!(history.is_empty());
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.flaky, 1);
    assert_eq!(report.summary.duration_ms, 200);
}

// ============================================================================
// Run document loading
// ============================================================================

#[test]
fn parses_run_document_with_defaults() {
    let json = r#"{
        "config": {"projects": [{"name": "chromium", "use": {"browserName": "chromium"}}]},
        "events": [
            {"id": "t1", "titlePath": ["", "chromium", "a.spec.ts", "works"], "status": "timedOut",
             "duration": 30000, "retry": 0, "errors": [{"message": "Timeout"}]},
            {"titlePath": ["", "x"]}
        ]
    }"#;
    let doc = parse_run_document(json).unwrap();
    let config = doc.config.unwrap();
    assert_eq!(config.projects[0].use_options.browser_name.as_deref(), Some("chromium"));
    assert_eq!(doc.events.len(), 2);
    assert_eq!(doc.events[0].status, Some(RawStatus::TimedOut));
    assert_eq!(doc.events[1].status, None);
    assert_eq!(doc.events[1].display_title(), "x");
    assert_eq!(doc.events[1].project(), "default");
}

#[test]
fn odd_events_do_not_reject_the_document() {
    let json = r#"{
        "events": [
            {"id": "a", "titlePath": ["", "a"], "status": "queued", "location": {"line": 4}},
            {"id": "b", "titlePath": ["", "b"], "status": "passed", "duration": 10}
        ]
    }"#;
    let doc = parse_run_document(json).unwrap();
    assert_eq!(doc.events[0].status, Some(RawStatus::Unknown));
    assert_eq!(doc.events[0].location.as_ref().map(|l| l.line), Some(4));

    let dir = tempfile::tempdir().unwrap();
    let outcome = run_document(
        &doc,
        options_in(dir.path()),
        &HtmlRenderer::default(),
        &RecordingRenderer::default(),
    )
    .unwrap();
    let summary = &outcome.report.summary;
    assert_eq!((summary.total, summary.passed, summary.skipped), (2, 1, 1));
    assert!(outcome.report.cases[0].location.is_none());
}

#[test]
fn load_reports_missing_and_malformed_files() {
    let dir = tempfile::tempdir().unwrap();

    let missing = load_run_document(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(missing, ReportError::ReadEvents { .. }));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "[1, 2").unwrap();
    let malformed = load_run_document(&bad).unwrap_err();
    assert!(matches!(malformed, ReportError::ParseEvents { .. }));
}
