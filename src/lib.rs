//! Folds browser test-runner events into a report: per-case retry folding,
//! flaky detection, step-tree cleanup, error classification, summary metrics
//! and a rolling run history, rendered to HTML and PDF.

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod error;
pub mod events;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod render;
pub mod report;
pub mod reporter;

pub use aggregate::aggregator::{CaseAggregator, aggregate_events};
pub use aggregate::case_model::{AttemptDetail, CaseDetail, StepDetail, TestStatus};
pub use error::ReportError;
pub use report::assembler::assemble;
pub use report::report_model::ReportData;
