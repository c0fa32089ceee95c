use std::fmt::Write as _;
use std::path::PathBuf;

use once_cell::unsync::OnceCell;
use tracing::{debug, warn};

use crate::aggregate::case_model::{CaseDetail, StepDetail, TestStatus};
use crate::aggregate::steps::count_steps;
use crate::cli::config::Theme;
use crate::metrics::format::{format_duration, format_timestamp};
use crate::report::report_model::ReportData;

// ============================================================================
// HTML reporter — self-contained HTML document, input for the PDF renderer
// ============================================================================

/// Lazily loaded assets shared by every render of one renderer.
#[derive(Debug, Default)]
pub struct AssetCache {
    chart_bundle_path: Option<PathBuf>,
    chart_bundle: OnceCell<Option<String>>,
}

impl AssetCache {
    pub fn new(chart_bundle_path: Option<PathBuf>) -> Self {
        Self {
            chart_bundle_path,
            chart_bundle: OnceCell::new(),
        }
    }

    /// Chart script, read from disk on first use. A missing bundle disables
    /// the trend chart; the trend table is always rendered.
    pub fn chart_bundle(&self) -> Option<&str> {
        self.chart_bundle
            .get_or_init(|| {
                let path = self.chart_bundle_path.as_ref()?;
                match std::fs::read_to_string(path) {
                    Ok(script) => {
                        debug!(path = %path.display(), "chart bundle loaded");
                        Some(script)
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "chart bundle unavailable");
                        None
                    }
                }
            })
            .as_deref()
    }
}

/// Renders a [`ReportData`] into one HTML document.
#[derive(Debug, Default)]
pub struct HtmlRenderer {
    assets: AssetCache,
}

struct Palette {
    background: &'static str,
    surface: &'static str,
    text: &'static str,
    muted: &'static str,
    border: &'static str,
}

const LIGHT: Palette = Palette {
    background: "#f5f5f5",
    surface: "#ffffff",
    text: "#212121",
    muted: "#666666",
    border: "#e0e0e0",
};

const DARK: Palette = Palette {
    background: "#121212",
    surface: "#1e1e1e",
    text: "#eeeeee",
    muted: "#aaaaaa",
    border: "#333333",
};

const PASS_COLOR: &str = "#4CAF50";
const FAIL_COLOR: &str = "#f44336";

impl HtmlRenderer {
    pub fn new(assets: AssetCache) -> Self {
        Self { assets }
    }

    pub fn render(&self, report: &ReportData) -> String {
        let palette = match report.options.theme {
            Theme::Light => &LIGHT,
            Theme::Dark => &DARK,
        };
        let mode = report.options.report_type;

        let mut body = String::new();
        body.push_str(&render_overview(report));
        body.push_str(&render_scope(report));
        body.push_str(&self.render_trend(report));
        if mode.shows_cases() {
            body.push_str(&render_cases(&report.cases));
        }
        if mode.shows_defects() {
            body.push_str(&render_defects(&report.failures));
        }
        body.push_str(&render_sections(report));

        let header_color = if report.all_passed() {
            PASS_COLOR
        } else {
            FAIL_COLOR
        };

        format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="author" content="{author}">
<title>{title}</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; padding: 0; background: {background}; color: {text}; }}
.header {{ background: {header_color}; color: white; padding: 20px 30px; }}
.header h1 {{ margin: 0 0 8px 0; font-size: 24px; }}
.header p {{ margin: 0; font-size: 14px; opacity: 0.9; }}
.content {{ max-width: 900px; margin: 20px auto; padding: 0 20px; }}
section {{ background: {surface}; border-radius: 6px; padding: 16px 20px; margin-bottom: 12px; border: 1px solid {border}; }}
section h2 {{ margin: 0 0 12px 0; font-size: 18px; }}
table {{ width: 100%; border-collapse: collapse; font-size: 13px; }}
th, td {{ text-align: left; padding: 4px 6px; border-bottom: 1px solid {border}; }}
.muted {{ color: {muted}; }}
.passed {{ color: {pass_color}; }}
.failed {{ color: {fail_color}; font-weight: bold; }}
.skipped, .interrupted {{ color: {muted}; }}
.warning {{ color: #ff9800; }}
.steps {{ margin: 4px 0 0 0; padding-left: 18px; font-size: 12px; }}
.error {{ color: {fail_color}; white-space: pre-wrap; font-size: 12px; }}
img.screenshot {{ max-width: 100%; border: 1px solid {border}; margin-top: 6px; }}
</style>
</head>
<body>
<div class="header">
<h1>{title}</h1>
<p>{project} &middot; build {build} &middot; {environment} &middot; {passed} passed, {failed} failed, {skipped} skipped ({total} total) in {duration}</p>
</div>
<div class="content">
{body}
</div>
</body>
</html>"##,
            title = escape_html(&report.metadata.title),
            author = escape_html(&report.metadata.author),
            project = escape_html(&report.metadata.project),
            build = escape_html(&report.metadata.build),
            environment = escape_html(&report.metadata.environment),
            background = palette.background,
            surface = palette.surface,
            text = palette.text,
            muted = palette.muted,
            border = palette.border,
            header_color = header_color,
            pass_color = PASS_COLOR,
            fail_color = FAIL_COLOR,
            passed = report.summary.passed,
            failed = report.summary.failed,
            skipped = report.summary.skipped,
            total = report.summary.total,
            duration = format_duration(report.summary.duration_ms),
            body = body,
        )
    }

    fn render_trend(&self, report: &ReportData) -> String {
        let mut out = format!(
            "<section class=\"trend\">\n<h2>Trend: {}</h2>\n",
            escape_html(&report.options.trend_label)
        );

        if report.history.is_empty() {
            out.push_str("<p class=\"muted\">No historical runs recorded yet.</p>\n</section>\n");
            return out;
        }

        if let Some(script) = self.assets.chart_bundle() {
            let labels: Vec<&str> = report
                .history
                .iter()
                .map(|h| h.timestamp.as_str())
                .collect();
            let reliability: Vec<String> = report
                .history
                .iter()
                .map(|h| h.reliability_score.to_string())
                .collect();
            let _ = write!(
                out,
                "<canvas id=\"trend\" height=\"120\"></canvas>\n<script>{}</script>\n<script>new Chart(document.getElementById('trend'), {{ type: 'line', data: {{ labels: {}, datasets: [{{ label: 'Reliability %', data: [{}] }}] }}, options: {{ animation: false }} }});</script>\n",
                script,
                script_json(&labels),
                reliability.join(",")
            );
        }

        out.push_str("<table>\n<tr><th>Run</th><th>Total</th><th>Passed</th><th>Failed</th><th>Skipped</th><th>Duration</th><th>Coverage</th><th>Reliability</th></tr>\n");
        for entry in &report.history {
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}%</td><td>{:.2}%</td></tr>",
                escape_html(&entry.timestamp),
                entry.total,
                entry.passed,
                entry.failed,
                entry.skipped,
                format_duration(entry.duration_ms),
                entry.coverage_percent,
                entry.reliability_score
            );
        }
        out.push_str("</table>\n</section>\n");
        out
    }
}

fn render_overview(report: &ReportData) -> String {
    let s = &report.summary;
    let m = &report.metrics;
    let e = &report.environment;

    let mut out = String::from("<section class=\"overview\">\n<h2>Summary</h2>\n<table>\n");
    let rows = [
        ("Total", s.total.to_string()),
        ("Passed", s.passed.to_string()),
        ("Failed", s.failed.to_string()),
        ("Skipped", s.skipped.to_string()),
        ("Flaky", s.flaky.to_string()),
        ("Duration", format_duration(s.duration_ms)),
        ("Started", format_timestamp(s.start_time)),
        ("Finished", format_timestamp(s.end_time)),
        ("Coverage", format!("{:.2}%", m.coverage_percent)),
        ("Reliability", format!("{:.2}%", m.reliability_score)),
        ("Maintainability (heuristic)", format!("{:.0}", m.maintainability_index)),
        ("Reusability (heuristic)", format!("{:.0}", m.reusability_score)),
        ("Browsers", e.browsers.join(", ")),
        ("Devices", e.devices.join(", ")),
        ("Platforms", e.operating_systems.join(", ")),
        ("Author", report.metadata.author.clone()),
        ("Release", report.metadata.release.clone()),
    ];
    for (label, value) in rows {
        let _ = writeln!(
            out,
            "<tr><th>{}</th><td>{}</td></tr>",
            label,
            escape_html(&value)
        );
    }
    if !report.metadata.ci_link.is_empty() {
        let link = escape_html(&report.metadata.ci_link);
        let _ = writeln!(out, "<tr><th>CI</th><td><a href=\"{0}\">{0}</a></td></tr>", link);
    }
    if !report.metadata.tags.is_empty() {
        let _ = writeln!(
            out,
            "<tr><th>Tags</th><td>{}</td></tr>",
            escape_html(&report.metadata.tags.join(", "))
        );
    }
    out.push_str("</table>\n");

    for warning in &report.warnings {
        let _ = writeln!(out, "<p class=\"warning\">{}</p>", escape_html(warning));
    }
    out.push_str("</section>\n");
    out
}

fn render_scope(report: &ReportData) -> String {
    let scope = &report.scope;
    let mut out = String::from("<section class=\"scope\">\n<h2>Scope</h2>\n");
    out.push_str(&render_list("Objectives", &scope.objectives));
    out.push_str(&render_list("Data sets", &scope.data_sets));
    out.push_str(&render_list("Pass criteria", &scope.pass_criteria));
    out.push_str(&render_list("Risks", &scope.risks));
    let _ = writeln!(out, "<p class=\"muted\">{}</p>", escape_html(&scope.alignment));
    out.push_str("</section>\n");
    out
}

fn render_sections(report: &ReportData) -> String {
    let sections = &report.sections;
    let mut out = String::from("<section class=\"notes\">\n<h2>Notes</h2>\n");
    out.push_str(&render_list("Challenges", &sections.challenges));
    out.push_str(&render_list("Lessons learned", &sections.lessons_learned));
    out.push_str(&render_list("Recommendations", &sections.recommendations));
    out.push_str("</section>\n");
    out
}

fn render_list(heading: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut out = format!("<h3>{}</h3>\n<ul>\n", heading);
    for item in items {
        let _ = writeln!(out, "<li>{}</li>", escape_html(item));
    }
    out.push_str("</ul>\n");
    out
}

fn render_cases(cases: &[CaseDetail]) -> String {
    let mut out = String::from("<section class=\"cases\">\n<h2>Execution</h2>\n<table>\n<tr><th>Test</th><th>Project</th><th>Status</th><th>Duration</th><th>Attempts</th><th>Steps</th></tr>\n");
    for case in cases {
        let _ = writeln!(
            out,
            "<tr id=\"{id}\"><td>{path}<div class=\"muted\">{location}</div>{steps}</td><td>{project}</td><td class=\"{class}\">{status}</td><td>{duration}</td><td>{attempts}</td><td>{step_count}</td></tr>",
            id = escape_html(&case.id),
            path = escape_html(&case.path),
            location = escape_html(case.location.as_deref().unwrap_or("")),
            steps = render_steps(&case.steps),
            project = escape_html(&case.project_name),
            class = case.status.label(),
            status = case.status.label(),
            duration = format_duration(case.duration),
            attempts = case.attempts.len(),
            step_count = count_steps(&case.steps),
        );
    }
    out.push_str("</table>\n</section>\n");
    out
}

fn render_steps(steps: &[StepDetail]) -> String {
    if steps.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"steps\">");
    for step in steps {
        let duration = step
            .duration
            .map(|ms| format!(" <span class=\"muted\">{}ms</span>", ms))
            .unwrap_or_default();
        let _ = write!(
            out,
            "<li class=\"{}\">{}{}{}</li>",
            step.status.label(),
            escape_html(&step.title),
            duration,
            render_steps(&step.steps)
        );
    }
    out.push_str("</ul>");
    out
}

fn render_defects(failures: &[CaseDetail]) -> String {
    let mut out = String::from("<section class=\"defects\">\n<h2>Defects</h2>\n");
    if failures.is_empty() {
        out.push_str("<p class=\"muted\">No failures.</p>\n</section>\n");
        return out;
    }

    for case in failures {
        let _ = writeln!(
            out,
            "<h3 class=\"{}\">{}</h3>",
            case.status.label(),
            escape_html(&case.path)
        );
        for error in &case.errors {
            let link = error
                .issue_link
                .as_deref()
                .map(|l| format!(" &middot; <a href=\"{0}\">{0}</a>", escape_html(l)))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "<p class=\"muted\">{} &middot; severity {}{}</p>\n<div class=\"error\">{}</div>",
                error.category.label(),
                error.severity.label(),
                link,
                escape_html(&error.message)
            );
        }
        for attachment in case.attachments.iter().filter(|a| a.is_image()) {
            if let Some(body) = &attachment.body {
                let _ = writeln!(
                    out,
                    "<img class=\"screenshot\" alt=\"{}\" src=\"{}\">",
                    escape_html(&attachment.name),
                    body
                );
            }
        }
        if case.status == TestStatus::Failed && case.errors.is_empty() {
            out.push_str("<p class=\"muted\">No error details reported.</p>\n");
        }
    }
    out.push_str("</section>\n");
    out
}

/// JSON literal safe to embed inside a `<script>` element.
fn script_json(labels: &[&str]) -> String {
    serde_json::to_string(labels)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/")
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
