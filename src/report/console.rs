use crate::aggregate::case_model::TestStatus;
use crate::history::store::HistoricalEntry;
use crate::metrics::format::format_duration;
use crate::report::report_model::ReportData;

// ============================================================================
// Console reporter — formatted terminal output
// ============================================================================

/// Format a finished report for the terminal.
///
/// Produces output like:
/// ```text
/// === Playwright Automation Report ===
///
/// ✓ PASS  suite › logs in (1.2s)
/// ✗ FAIL  suite › checks out (0.9s, 2 attempts)
///     [performance/high] Timeout 5000ms exceeded
///
/// === Results: 1 passed, 1 failed, 0 skipped, 0 flaky (2 total) in 2s ===
/// ```
pub fn format_console_report(report: &ReportData) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n\n", report.metadata.title));

    for case in &report.cases {
        let marker = match case.status {
            TestStatus::Passed => "\u{2713} PASS",
            TestStatus::Failed => "\u{2717} FAIL",
            TestStatus::Skipped => "- SKIP",
            TestStatus::Interrupted => "! INTR",
        };

        let attempts = if case.attempts.len() > 1 {
            format!(", {} attempts", case.attempts.len())
        } else {
            String::new()
        };

        out.push_str(&format!(
            "{}  {} ({:.1}s{})\n",
            marker,
            case.path,
            case.duration as f64 / 1000.0,
            attempts
        ));

        if case.status != TestStatus::Passed {
            for error in &case.errors {
                let first_line = error.message.lines().next().unwrap_or("");
                out.push_str(&format!(
                    "    [{}/{}] {}\n",
                    error.category.label(),
                    error.severity.label(),
                    first_line
                ));
                if let Some(link) = &error.issue_link {
                    out.push_str(&format!("    issue: {}\n", link));
                }
            }
        }
    }

    for warning in &report.warnings {
        out.push_str(&format!("\nwarning: {}\n", warning));
    }

    let s = &report.summary;
    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed, {} skipped, {} flaky ({} total) in {} ===\n",
        s.passed,
        s.failed,
        s.skipped,
        s.flaky,
        s.total,
        format_duration(s.duration_ms)
    ));

    out
}

/// Format history entries as a plain table.
pub fn format_history(entries: &[HistoricalEntry]) -> String {
    if entries.is_empty() {
        return "No history recorded.\n".to_string();
    }

    let mut out = format!(
        "{:<32} {:>6} {:>6} {:>6} {:>7} {:>10} {:>9} {:>11}\n",
        "timestamp", "total", "passed", "failed", "skipped", "duration", "coverage", "reliability"
    );
    for e in entries {
        out.push_str(&format!(
            "{:<32} {:>6} {:>6} {:>6} {:>7} {:>10} {:>8.2}% {:>10.2}%\n",
            e.timestamp,
            e.total,
            e.passed,
            e.failed,
            e.skipped,
            format_duration(e.duration_ms),
            e.coverage_percent,
            e.reliability_score
        ));
    }
    out
}
