use std::collections::BTreeMap;

use tracing::debug;

use crate::aggregate::case_model::{CaseDetail, TestStatus};
use crate::cli::config::ResolvedOptions;
use crate::events::event_model::RunConfig;
use crate::history::store::{HistoricalEntry, display_window};
use crate::metrics::format::now_ms;
use crate::metrics::summary::{derive_metrics, summarize};
use crate::report::report_model::{
    EnvironmentInfo, ReportData, ResolvedMetadata, ResolvedScope, ResolvedSections,
};

pub const NO_CASES_WARNING: &str = "No test cases were executed.";

/// Compose the report from the aggregated cases, using the process
/// environment and the current clock.
pub fn assemble(
    cases: Vec<CaseDetail>,
    config: Option<&RunConfig>,
    options: &ResolvedOptions,
    warnings: Vec<String>,
    history: &[HistoricalEntry],
) -> ReportData {
    assemble_with(
        cases,
        config,
        options,
        warnings,
        history,
        &|key| std::env::var(key).ok(),
        now_ms(),
    )
}

/// Deterministic variant of [`assemble`]: environment lookups and "now" are
/// supplied by the caller.
pub fn assemble_with(
    cases: Vec<CaseDetail>,
    config: Option<&RunConfig>,
    options: &ResolvedOptions,
    mut warnings: Vec<String>,
    history: &[HistoricalEntry],
    env: &dyn Fn(&str) -> Option<String>,
    now_ms: i64,
) -> ReportData {
    if cases.is_empty() && !warnings.iter().any(|w| w == NO_CASES_WARNING) {
        warnings.push(NO_CASES_WARNING.to_string());
    }

    let summary = summarize(&cases, now_ms);
    let metrics = derive_metrics(&summary);
    let failures: Vec<CaseDetail> = cases
        .iter()
        .filter(|c| c.status != TestStatus::Passed)
        .cloned()
        .collect();

    debug!(
        total = summary.total,
        failures = failures.len(),
        history = history.len(),
        "assembling report"
    );

    ReportData {
        options: options.clone(),
        summary,
        scope: resolve_scope(options),
        metadata: resolve_metadata(options, env),
        environment: build_environment(config),
        cases,
        failures,
        metrics,
        history: display_window(history),
        sections: resolve_sections(options),
        warnings,
        reporter_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

// ============================================================================
// Default tables
// ============================================================================

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn resolve_metadata(
    options: &ResolvedOptions,
    env: &dyn Fn(&str) -> Option<String>,
) -> ResolvedMetadata {
    let m = &options.metadata;
    let or_env = |value: &Option<String>, key: &str, fallback: &str| {
        value
            .clone()
            .or_else(|| env(key))
            .unwrap_or_else(|| fallback.to_string())
    };

    ResolvedMetadata {
        title: m
            .title
            .clone()
            .unwrap_or_else(|| "Playwright Automation Report".to_string()),
        author: or_env(&m.author, "GIT_AUTHOR_NAME", "Automation Bot"),
        build: or_env(&m.build, "BUILD_ID", "local"),
        environment: or_env(&m.environment, "NODE_ENV", "local"),
        project: m.project.clone().unwrap_or_else(|| "default".to_string()),
        release: or_env(&m.release, "RELEASE_NAME", "rolling"),
        ci_link: or_env(&m.ci_link, "CI_JOB_URL", ""),
        tags: m.tags.clone().unwrap_or_default(),
    }
}

pub fn resolve_scope(options: &ResolvedOptions) -> ResolvedScope {
    let s = &options.scope;
    ResolvedScope {
        objectives: s.objectives.clone().unwrap_or_else(|| {
            strings(&[
                "Validate end-to-end user journeys",
                "Ensure regression stability for critical flows",
            ])
        }),
        data_sets: s
            .data_sets
            .clone()
            .unwrap_or_else(|| strings(&["Synthetic test data", "Seeded accounts"])),
        pass_criteria: s.pass_criteria.clone().unwrap_or_else(|| {
            strings(&["All P0/P1 cases pass", "No critical regressions filed"])
        }),
        risks: s
            .risks
            .clone()
            .unwrap_or_else(|| strings(&["Flaky network environments", "3rd party dependencies"])),
        alignment: s
            .alignment
            .clone()
            .unwrap_or_else(|| "Supports release readiness and CI quality gates".to_string()),
    }
}

pub fn resolve_sections(options: &ResolvedOptions) -> ResolvedSections {
    let c = &options.custom_sections;
    ResolvedSections {
        challenges: c.challenges.clone().unwrap_or_else(|| {
            strings(&[
                "Intermittent latency from downstream APIs",
                "Maintenance of shared fixtures across suites",
            ])
        }),
        lessons_learned: c.lessons_learned.clone().unwrap_or_else(|| {
            strings(&[
                "Parallelizing specs reduced suite time by 30%",
                "Centralized test data catalog improved reusability",
            ])
        }),
        recommendations: c.recommendations.clone().unwrap_or_else(|| {
            strings(&[
                "Stabilize flaky selectors using resilient locating strategies",
                "Automate build health checks with PDF summaries in CI",
            ])
        }),
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Enumerate browsers, devices and platforms from the runner config.
///
/// Without a config the report falls back to chromium on the host OS.
pub fn build_environment(config: Option<&RunConfig>) -> EnvironmentInfo {
    let host_os = platform_name(std::env::consts::OS).to_string();

    let Some(config) = config else {
        return EnvironmentInfo {
            browsers: vec!["chromium".to_string()],
            devices: Vec::new(),
            operating_systems: vec![host_os],
            config_matrix: Vec::new(),
        };
    };

    let mut env = EnvironmentInfo::default();

    for project in &config.projects {
        let opts = &project.use_options;

        if let Some(browser) = &opts.browser_name {
            push_unique(&mut env.browsers, browser.clone());
        }
        if let Some(channel) = &opts.channel {
            let browser = opts.browser_name.as_deref().unwrap_or("chromium");
            push_unique(&mut env.browsers, format!("{} ({})", browser, channel));
        }
        if let Some(device) = &opts.device {
            push_unique(&mut env.devices, device.clone());
        }
        if let Some(platform) = &opts.platform {
            push_unique(&mut env.operating_systems, platform.clone());
        }

        let mut row = BTreeMap::new();
        row.insert("project".to_string(), project.name.clone());
        if let Some(viewport) = opts.viewport {
            row.insert(
                "viewport".to_string(),
                format!("{}x{}", viewport.width, viewport.height),
            );
        }
        row.insert(
            "headless".to_string(),
            opts.headless.unwrap_or(true).to_string(),
        );
        env.config_matrix.push(row);
    }

    if env.operating_systems.is_empty() {
        env.operating_systems.push(host_os);
    }

    env
}

/// Host OS in the naming browser test runners report (`darwin`, `win32`).
pub fn platform_name(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

/// Insertion-ordered set semantics.
fn push_unique(items: &mut Vec<String>, value: String) {
    if !items.contains(&value) {
        items.push(value);
    }
}
