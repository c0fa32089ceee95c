use crate::aggregate::case_model::{StepDetail, TestStatus};
use crate::events::event_model::RawStep;

// ============================================================================
// Step tree normalization
// ============================================================================

const HOOK_KEYWORDS: [&str; 4] = ["beforeall", "afterall", "beforeeach", "aftereach"];
const IGNORED_CATEGORIES: [&str; 2] = ["hook", "fixture"];

/// Normalize a raw step forest into a display tree.
///
/// Hook and fixture nodes are dropped, their (already normalized) children
/// take their place among the siblings. Sibling order is preserved.
pub fn normalize_steps(raw: &[RawStep]) -> Vec<StepDetail> {
    raw.iter().flat_map(normalize_node).collect()
}

fn normalize_node(step: &RawStep) -> Vec<StepDetail> {
    let children = normalize_steps(&step.steps);

    if is_hook(step) {
        return children;
    }

    vec![StepDetail {
        title: step.title.clone(),
        status: if step.error.is_some() {
            TestStatus::Failed
        } else {
            TestStatus::Passed
        },
        category: step.category.clone(),
        duration: step.duration,
        steps: children,
    }]
}

/// Whether a step is hook/fixture plumbing rather than a user action.
pub fn is_hook(step: &RawStep) -> bool {
    if let Some(category) = &step.category {
        let lower = category.to_lowercase();
        if IGNORED_CATEGORIES.contains(&lower.as_str()) {
            return true;
        }
    }

    let title = step.title.to_lowercase();
    HOOK_KEYWORDS.iter().any(|k| title.contains(k))
}

/// Total number of nodes in a normalized tree.
pub fn count_steps(steps: &[StepDetail]) -> usize {
    steps.iter().map(|s| 1 + count_steps(&s.steps)).sum()
}

impl From<&StepDetail> for RawStep {
    /// Turn a display node back into the raw shape. A failed node carries a
    /// placeholder error so that re-normalizing yields the same status.
    fn from(step: &StepDetail) -> Self {
        RawStep {
            title: step.title.clone(),
            category: step.category.clone(),
            duration: step.duration,
            error: (step.status == TestStatus::Failed)
                .then(|| serde_json::json!({ "message": "step failed" })),
            steps: step.steps.iter().map(RawStep::from).collect(),
        }
    }
}
