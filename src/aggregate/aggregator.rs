use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use tracing::{debug, trace};

use crate::aggregate::case_model::{AttachmentSummary, AttemptDetail, CaseDetail, TestStatus};
use crate::aggregate::steps::normalize_steps;
use crate::classify::error_classifier::classify;
use crate::events::event_model::{RawAttachment, RawTestEvent};
use crate::metrics::format::slugify;

const PATH_SEPARATOR: &str = " › ";

// ============================================================================
// Case aggregator — folds attempt events into one record per logical test
// ============================================================================

/// Folds per-attempt events into `CaseDetail` records.
///
/// Cases live in an arena in first-seen order; the key map only stores
/// arena indices, so no references into the arena leave this type.
#[derive(Debug, Default)]
pub struct CaseAggregator {
    include_screenshots: bool,
    bug_tracker_base_url: Option<String>,
    cases: Vec<CaseDetail>,
    index_by_key: HashMap<String, usize>,
    used_ids: HashSet<String>,
}

impl CaseAggregator {
    pub fn new(include_screenshots: bool, bug_tracker_base_url: Option<String>) -> Self {
        Self {
            include_screenshots,
            bug_tracker_base_url,
            ..Self::default()
        }
    }

    /// Observe one attempt-completion event.
    pub fn observe(&mut self, event: &RawTestEvent) {
        let key = case_key(event);
        let attempt = self.to_attempt(event);

        match self.index_by_key.get(&key) {
            Some(&index) => {
                trace!(case = %key, retry = attempt.index, "merging retry attempt");
                if let Some(existing) = self.cases.get_mut(index) {
                    merge_attempt(existing, attempt);
                }
            }
            None => {
                let id = self.unique_id(event);
                debug!(case = %key, id = %id, "new case");
                let detail = seed_case(id, event, attempt);
                self.index_by_key.insert(key, self.cases.len());
                self.cases.push(detail);
            }
        }
    }

    /// Number of distinct cases seen so far.
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Finish the run and hand out the cases in first-seen order.
    pub fn finish(self) -> Vec<CaseDetail> {
        self.cases
    }

    fn to_attempt(&self, event: &RawTestEvent) -> AttemptDetail {
        AttemptDetail {
            index: event.retry,
            status: TestStatus::from_raw(event.status),
            duration: event.duration,
            steps: normalize_steps(&event.steps),
            attachments: event
                .attachments
                .iter()
                .map(|a| summarize_attachment(a, self.include_screenshots))
                .collect(),
            errors: event
                .errors
                .iter()
                .map(|e| classify(e, self.bug_tracker_base_url.as_deref()))
                .collect(),
            started_at: event.start_time,
            completed_at: event
                .start_time
                .map(|start| start.saturating_add(i64::try_from(event.duration).unwrap_or(i64::MAX))),
        }
    }

    /// Slug of the title path, made unique within the run.
    fn unique_id(&mut self, event: &RawTestEvent) -> String {
        let position = self.cases.len() + 1;
        let slug = slugify(&event.title_path.join("-"));
        let base = if slug.is_empty() {
            format!("case-{}", position)
        } else {
            slug
        };

        let id = if self.used_ids.contains(&base) {
            format!("{}-{}", base, position)
        } else {
            base
        };
        self.used_ids.insert(id.clone());
        id
    }
}

/// Aggregate a whole event stream in one go.
pub fn aggregate_events<'a>(
    events: impl IntoIterator<Item = &'a RawTestEvent>,
    include_screenshots: bool,
    bug_tracker_base_url: Option<&str>,
) -> Vec<CaseDetail> {
    let mut aggregator =
        CaseAggregator::new(include_screenshots, bug_tracker_base_url.map(str::to_string));
    for event in events {
        aggregator.observe(event);
    }
    aggregator.finish()
}

/// Stable identity of a logical test, independent of the retry index.
///
/// Uses the runner id when present, otherwise a fingerprint of the project
/// and title path.
pub fn case_key(event: &RawTestEvent) -> String {
    if let Some(id) = event.id.as_deref().filter(|id| !id.is_empty()) {
        return id.to_string();
    }

    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(event.project().as_bytes());
    for segment in &event.title_path {
        hasher.update([0u8]);
        hasher.update(segment.as_bytes());
    }
    format!("fp-{:x}", hasher.finalize())
}

fn seed_case(id: String, event: &RawTestEvent, attempt: AttemptDetail) -> CaseDetail {
    let annotations: BTreeMap<String, String> = event
        .annotations
        .iter()
        .map(|a| (a.kind.clone(), a.description.clone().unwrap_or_default()))
        .collect();

    let path = event
        .title_path
        .iter()
        .filter(|segment| !segment.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR);

    CaseDetail {
        id,
        title: event.display_title(),
        path,
        project_name: event.project().to_string(),
        location: event
            .location
            .as_ref()
            .filter(|l| !l.file.is_empty())
            .map(|l| format!("{}:{}", l.file, l.line)),
        annotations,
        status: attempt.status,
        duration: attempt.duration,
        steps: attempt.steps.clone(),
        attachments: attempt.attachments.clone(),
        errors: attempt.errors.clone(),
        started_at: attempt.started_at,
        completed_at: attempt.completed_at,
        attempts: vec![attempt],
    }
}

/// Fold a further attempt into an existing case.
///
/// Duration accumulates; display fields are recomputed from the
/// highest-index attempt regardless of arrival order.
pub fn merge_attempt(detail: &mut CaseDetail, attempt: AttemptDetail) {
    detail.duration = detail.duration.saturating_add(attempt.duration);
    detail.started_at = widen(detail.started_at, attempt.started_at, i64::min);
    detail.completed_at = widen(detail.completed_at, attempt.completed_at, i64::max);

    detail.attempts.push(attempt);
    detail.attempts.sort_by_key(|a| a.index);

    if let Some(latest) = detail.attempts.last() {
        detail.status = latest.status;
        detail.steps = latest.steps.clone();
        detail.attachments = latest.attachments.clone();
        detail.errors = latest.errors.clone();
    }
}

fn widen(current: Option<i64>, incoming: Option<i64>, pick: fn(i64, i64) -> i64) -> Option<i64> {
    match (current, incoming) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

// ============================================================================
// Attachments
// ============================================================================

/// Summarize a raw attachment, inlining image files as data URIs when
/// screenshots are enabled. An unreadable file leaves the body empty.
pub fn summarize_attachment(raw: &RawAttachment, include_screenshots: bool) -> AttachmentSummary {
    let content_type = raw
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let name = raw
        .name
        .clone()
        .or_else(|| raw.content_type.clone())
        .unwrap_or_else(|| "attachment".to_string());

    let mut summary = AttachmentSummary {
        name,
        content_type,
        path: raw.path.clone(),
        body: None,
    };

    if include_screenshots && summary.is_image() {
        if let Some(path) = &raw.path {
            summary.body = inline_image(Path::new(path), &summary.content_type);
        }
    }

    summary
}

fn inline_image(path: &Path, content_type: &str) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(format!("data:{};base64,{}", content_type, BASE64.encode(bytes))),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "attachment not readable, skipping inline body");
            None
        }
    }
}
