//! Editor configuration.

use crate::document::DEFAULT_BACKGROUND_COLOR;
use crate::shapes::{DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH};
use serde::{Deserialize, Serialize};

/// Tunables for the editor. Missing fields take their defaults when parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Visible canvas width, used for randomized shape placement.
    pub canvas_width: f64,
    /// Visible canvas height, used for randomized shape placement.
    pub canvas_height: f64,
    /// Color for new freehand strokes.
    pub stroke_color: String,
    /// Width for new freehand strokes.
    pub stroke_width: f64,
    /// Eraser reach on each axis, in canvas pixels.
    pub eraser_tolerance: f64,
    /// Pick distance for clicking connections.
    pub hit_tolerance: f64,
    /// Smallest width/height a resize may produce.
    pub min_shape_size: f64,
    /// Padding around content when computing export bounds.
    pub export_padding: f64,
    /// Cap on export width and height.
    pub export_max_size: f64,
    /// Background color of new diagrams.
    pub background_color: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1200.0,
            canvas_height: 800.0,
            stroke_color: DEFAULT_STROKE_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            eraser_tolerance: 10.0,
            hit_tolerance: 6.0,
            min_shape_size: 50.0,
            export_padding: 50.0,
            export_max_size: 5000.0,
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse a JSON config.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
