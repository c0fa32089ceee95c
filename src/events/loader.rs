use std::path::Path;

use tracing::debug;

use crate::error::ReportError;
use crate::events::event_model::RunDocument;

/// Load a run document from a JSON file.
pub fn load_run_document(path: &Path) -> Result<RunDocument, ReportError> {
    let content = std::fs::read_to_string(path).map_err(|e| ReportError::ReadEvents {
        path: path.to_path_buf(),
        source: e,
    })?;
    let document = parse_run_document(&content).map_err(|e| ReportError::ParseEvents {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(
        path = %path.display(),
        events = document.events.len(),
        has_config = document.config.is_some(),
        "loaded run document"
    );
    Ok(document)
}

/// Parse a run document from JSON text.
pub fn parse_run_document(content: &str) -> Result<RunDocument, serde_json::Error> {
    serde_json::from_str(content)
}
