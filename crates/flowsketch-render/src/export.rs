//! Export service abstraction.

use flowsketch_core::storage::BoxFuture;
use flowsketch_core::{DiagramState, Editor, ExportFormat, Notice, RequestKind};
use kurbo::Rect;
use thiserror::Error;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export format not supported: {}", .0.extension())]
    UnsupportedFormat(ExportFormat),
    #[error("Nothing to export")]
    EmptyDiagram,
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// A snapshot handed to an export backend.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub state: DiagramState,
    pub format: ExportFormat,
    /// Region of the canvas to capture.
    pub bounds: Rect,
}

/// Produces encoded bytes for a diagram snapshot.
///
/// The SVG backend lives in this crate; raster and PDF backends are supplied
/// by the host.
pub trait ExportService: Send + Sync {
    fn export(&self, request: &ExportRequest) -> BoxFuture<'_, ExportResult<Vec<u8>>>;
}

/// Build the export request for the editor's current diagram.
pub fn prepare_export(editor: &Editor, format: ExportFormat) -> ExportResult<ExportRequest> {
    let bounds = editor.export_bounds().ok_or(ExportError::EmptyDiagram)?;
    Ok(ExportRequest {
        state: editor.document().state().clone(),
        format,
        bounds,
    })
}

/// Export the editor's diagram through `service`.
///
/// Returns `None` while another export is running, when the view was
/// unmounted before the response arrived, or on failure. Failures are
/// queued as notices.
pub async fn export_diagram(
    editor: &mut Editor,
    service: &dyn ExportService,
    format: ExportFormat,
) -> Option<Vec<u8>> {
    let ticket = editor.begin_request(RequestKind::Export)?;
    let result = match prepare_export(editor, format) {
        Ok(request) => service.export(&request).await,
        Err(e) => Err(e),
    };
    if !editor.finish_request(ticket) {
        return None;
    }
    match result {
        Ok(bytes) => {
            log::info!(
                "render: exported {} bytes as {}",
                bytes.len(),
                format.extension()
            );
            Some(bytes)
        }
        Err(e) => {
            log::warn!("render: export failed: {e}");
            editor.push_notice(Notice::error(format!("Export failed: {e}")));
            None
        }
    }
}

/// File name for an exported diagram.
pub fn export_file_name(name: &str, format: ExportFormat) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "diagram" } else { stem.as_str() };
    format!("{stem}.{}", format.extension())
}
