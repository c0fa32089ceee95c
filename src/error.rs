use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Fatal failures of a report run.
///
/// Missing or corrupt auxiliary data (history, attachments) never shows up
/// here; it degrades to an absent value instead.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The run document could not be read
    #[error("failed to read run document '{path}': {source}")]
    ReadEvents {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The run document is not valid JSON for the expected schema
    #[error("failed to parse run document '{path}': {source}")]
    ParseEvents {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The output directory could not be created
    #[error("failed to create output directory '{path}': {source}")]
    CreateOutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An artifact (HTML, PDF, history) could not be written
    #[error("failed to write '{path}': {source}")]
    WriteArtifact {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization failed
    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        source: serde_json::Error,
    },

    /// The PDF renderer process failed to spawn (is Node.js installed?)
    #[error("failed to spawn PDF renderer '{program}' (is Node.js installed?): {source}")]
    RendererSpawn {
        program: String,
        source: std::io::Error,
    },

    /// I/O with the renderer process failed
    #[error("PDF renderer I/O error: {0}")]
    RendererIo(String),

    /// The renderer process exited unsuccessfully
    #[error("PDF renderer exited with {status}: {stderr}")]
    RendererFailed { status: ExitStatus, stderr: String },
}
