use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ReportError;
use crate::report::report_model::ResolvedMetadata;

const RENDER_SCRIPT: &str = include_str!("../../node/render_pdf.js");

/// Turns rendered HTML into a PDF file.
pub trait PdfRenderer {
    fn render(
        &self,
        html: &str,
        pdf_path: &Path,
        metadata: &ResolvedMetadata,
    ) -> Result<(), ReportError>;
}

/// Request written to the render script's stdin (one JSON document).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    html_path: &'a Path,
    pdf_path: &'a Path,
    title: &'a str,
    author: &'a str,
}

/// Renders through a headless Chromium driven by a Node.js Playwright script.
///
/// The script runs through `node -e`, so `playwright-core` is resolved from
/// the working directory.
#[derive(Debug, Clone)]
pub struct NodePdfRenderer {
    node_binary: String,
}

impl NodePdfRenderer {
    pub fn new(node_binary: impl Into<String>) -> Self {
        Self {
            node_binary: node_binary.into(),
        }
    }

    /// Write the HTML to a temp file the script can load.
    fn stage(html: &str) -> Result<tempfile::NamedTempFile, ReportError> {
        let mut file = tempfile::Builder::new()
            .prefix("run-report-")
            .suffix(".html")
            .tempfile()
            .map_err(|e| ReportError::RendererIo(format!("failed to create temp file: {}", e)))?;
        file.write_all(html.as_bytes())
            .map_err(|e| ReportError::RendererIo(format!("failed to stage HTML: {}", e)))?;
        Ok(file)
    }
}

impl Default for NodePdfRenderer {
    fn default() -> Self {
        Self::new("node")
    }
}

impl PdfRenderer for NodePdfRenderer {
    fn render(
        &self,
        html: &str,
        pdf_path: &Path,
        metadata: &ResolvedMetadata,
    ) -> Result<(), ReportError> {
        let html_file = Self::stage(html)?;

        let request = RenderRequest {
            html_path: html_file.path(),
            pdf_path,
            title: &metadata.title,
            author: &metadata.author,
        };
        let payload = serde_json::to_vec(&request).map_err(|e| ReportError::JsonSerialize {
            context: "render request".into(),
            source: e,
        })?;

        let child = Command::new(&self.node_binary)
            .arg("-e")
            .arg(RENDER_SCRIPT)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReportError::RendererSpawn {
                program: self.node_binary.clone(),
                source: e,
            })?;
        let mut guard = ChildGuard::new(child);
        debug!(program = %self.node_binary, pdf = %pdf_path.display(), "renderer started");

        guard.write_stdin(&payload)?;
        guard.wait_success()?;

        info!(pdf = %pdf_path.display(), "PDF rendered");
        Ok(())
    }
}

// ============================================================================
// Process guard — the child is killed and reaped on every exit path
// ============================================================================

struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    fn write_stdin(&mut self, payload: &[u8]) -> Result<(), ReportError> {
        let child = self
            .child
            .as_mut()
            .ok_or_else(|| ReportError::RendererIo("renderer already finished".into()))?;
        // Dropping stdin closes the pipe so the script sees EOF.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReportError::RendererIo("failed to capture renderer stdin".into()))?;
        stdin
            .write_all(payload)
            .map_err(|e| ReportError::RendererIo(format!("failed to write render request: {}", e)))
    }

    fn wait_success(&mut self) -> Result<(), ReportError> {
        let Some(mut child) = self.child.take() else {
            return Err(ReportError::RendererIo("renderer already finished".into()));
        };

        let mut stderr = String::new();
        if let Some(mut pipe) = child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }

        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => {
                let _ = child.kill();
                return Err(ReportError::RendererIo(format!("failed to wait for renderer: {}", e)));
            }
        };

        if status.success() {
            Ok(())
        } else {
            Err(ReportError::RendererFailed {
                status,
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
