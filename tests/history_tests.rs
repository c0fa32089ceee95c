use run_report::history::store::{
    HISTORY_WINDOW, HistoricalEntry, append_history, display_window, load_history,
    load_history_records, parse_entries,
};
use run_report::metrics::summary::{AutomationMetrics, SummaryStats};

fn records(entries: &[HistoricalEntry]) -> Vec<serde_json::Value> {
    entries
        .iter()
        .map(|e| serde_json::to_value(e).unwrap())
        .collect()
}

fn entry(n: usize) -> HistoricalEntry {
    HistoricalEntry {
        timestamp: format!("2026-01-{:02}T00:00:00+00:00", n % 28 + 1),
        total: n,
        passed: n,
        failed: 0,
        skipped: 0,
        duration_ms: n as u64 * 1000,
        coverage_percent: 100.0,
        reliability_score: 100.0,
    }
}

// ============================================================================
// Loading is best-effort
// ============================================================================

#[test]
fn disabled_history_loads_nothing() {
    assert!(load_history(None).is_empty());
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_history(Some(&dir.path().join("nope.json"))).is_empty());
}

#[test]
fn corrupt_or_non_array_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();

    let corrupt = dir.path().join("corrupt.json");
    std::fs::write(&corrupt, "{ not json").unwrap();
    assert!(load_history(Some(&corrupt)).is_empty());

    let object = dir.path().join("object.json");
    std::fs::write(&object, r#"{"total": 3}"#).unwrap();
    assert!(load_history(Some(&object)).is_empty());
}

#[test]
fn reads_camel_case_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(
        &path,
        r#"[{"timestamp":"2026-01-01T00:00:00Z","total":2,"passed":1,"failed":1,"skipped":0,
            "durationMs":2100,"coveragePercent":100.0,"reliabilityScore":50.0}]"#,
    )
    .unwrap();

    let entries = load_history(Some(&path));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].duration_ms, 2100);
    assert_eq!(entries[0].reliability_score, 50.0);
}

// ============================================================================
// Writing
// ============================================================================

#[test]
fn append_creates_parent_directory_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("pdf").join("history.json");

    let entries: Vec<HistoricalEntry> = (1..=3).map(entry).collect();
    append_history(Some(&path), &records(&entries[..2]), &entries[2]).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"durationMs\""), "on-disk keys are camelCase");
    assert!(content.contains('\n'), "pretty-printed");
    assert_eq!(load_history(Some(&path)), entries);
}

#[test]
fn append_keeps_full_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    let entries: Vec<HistoricalEntry> = (0..25).map(entry).collect();
    append_history(Some(&path), &records(&entries[..24]), &entries[24]).unwrap();
    assert_eq!(load_history(Some(&path)).len(), 25);
}

#[test]
fn append_without_path_is_noop() {
    assert!(append_history(None, &records(&[entry(1)]), &entry(2)).is_ok());
}

// ============================================================================
// Entries this version cannot read
// ============================================================================

const MIXED_HISTORY: &str = r#"[
  {"timestamp":"2026-01-01T00:00:00Z","total":2,"passed":2,"failed":0,"skipped":0,
   "durationMs":100,"coveragePercent":100.0,"reliabilityScore":100.0},
  {"timestamp":"2026-01-02T00:00:00Z","total":2,"passed":1,"failed":null,"tool":"other"},
  {"timestamp":"2026-01-03T00:00:00Z","total":3,"passed":3,"failed":0,"skipped":0,
   "durationMs":300,"coveragePercent":100.0,"reliabilityScore":100.0}
]"#;

#[test]
fn unreadable_entries_are_skipped_for_display() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, MIXED_HISTORY).unwrap();

    let raw = load_history_records(Some(&path));
    assert_eq!(raw.len(), 3, "every array element is kept");

    let typed = parse_entries(&raw);
    let totals: Vec<usize> = typed.iter().map(|e| e.total).collect();
    assert_eq!(totals, vec![2, 3]);
    assert_eq!(load_history(Some(&path)), typed);
}

#[test]
fn append_preserves_unreadable_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, MIXED_HISTORY).unwrap();

    let prior = load_history_records(Some(&path));
    append_history(Some(&path), &prior, &entry(9)).unwrap();

    let after = load_history_records(Some(&path));
    assert_eq!(after.len(), 4);
    assert_eq!(after[1]["tool"], "other");
    assert_eq!(load_history(Some(&path)).len(), 3);
}

#[test]
fn non_array_records_load_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, r#"{"entries": []}"#).unwrap();
    assert!(load_history_records(Some(&path)).is_empty());
}

#[test]
fn entry_from_report_copies_counts() {
    let summary = SummaryStats {
        total: 4,
        passed: 2,
        failed: 1,
        skipped: 1,
        flaky: 0,
        duration_ms: 3_000,
        start_time: 0,
        end_time: 0,
    };
    let metrics = AutomationMetrics {
        coverage_percent: 75.0,
        reliability_score: 66.67,
        maintainability_index: 95.0,
        reusability_score: 71.0,
    };

    let e = HistoricalEntry::from_report(&summary, &metrics);
    assert_eq!((e.total, e.passed, e.failed, e.skipped), (4, 2, 1, 1));
    assert_eq!(e.duration_ms, 3_000);
    assert_eq!(e.coverage_percent, 75.0);
    assert_eq!(e.reliability_score, 66.67);
    assert!(chrono::DateTime::parse_from_rfc3339(&e.timestamp).is_ok());
}

// ============================================================================
// Display window
// ============================================================================

#[test]
fn window_keeps_most_recent_in_order() {
    let entries: Vec<HistoricalEntry> = (0..25).map(entry).collect();
    let shown = display_window(&entries);

    assert_eq!(shown.len(), HISTORY_WINDOW);
    let totals: Vec<usize> = shown.iter().map(|e| e.total).collect();
    assert_eq!(totals, (5..25).collect::<Vec<_>>());
}

#[test]
fn short_history_is_shown_whole() {
    let entries: Vec<HistoricalEntry> = (0..3).map(entry).collect();
    assert_eq!(display_window(&entries), entries);
    assert!(display_window(&[]).is_empty());
}
