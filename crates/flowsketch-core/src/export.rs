//! Export framing.

use crate::document::DiagramState;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Output formats an export service may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Pdf,
    Svg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Svg => "image/svg+xml",
        }
    }
}

/// Union of shape and stroke extents, or `None` for an empty diagram.
pub fn content_bounds(state: &DiagramState) -> Option<Rect> {
    let shapes = state.shapes.iter().map(|s| s.bounds());
    let strokes = state.drawings.iter().filter_map(|d| d.bounds());
    shapes.chain(strokes).reduce(|acc, r| acc.union(r))
}

/// The region to export: content extents grown by `padding` on every side,
/// clamped to the positive quadrant, and capped at `max_size` per axis.
pub fn export_bounds(state: &DiagramState, padding: f64, max_size: f64) -> Option<Rect> {
    let content = content_bounds(state)?;
    let x = (content.x0 - padding).max(0.0);
    let y = (content.y0 - padding).max(0.0);
    let width = (content.width() + 2.0 * padding).min(max_size);
    let height = (content.height() + 2.0 * padding).min(max_size);
    Some(Rect::new(x, y, x + width, y + height))
}
