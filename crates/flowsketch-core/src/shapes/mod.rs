//! Diagram element definitions: shapes, connections and freehand strokes.

mod connection;
mod drawing;

pub use connection::{ArrowStyle, Connection, ConnectionId, LineStyle};
pub use drawing::{
    DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH, DrawingId, DrawingPath, PathPoint, PointKind,
};

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Width and height used when a text shape has no explicit size.
pub const TEXT_DEFAULT_SIZE: (f64, f64) = (200.0, 100.0);
/// Edge length used for square-ish shapes without an explicit size.
pub const SHAPE_DEFAULT_EDGE: f64 = 128.0;
/// Height of a rectangle without an explicit size.
pub const RECTANGLE_DEFAULT_HEIGHT: f64 = 80.0;

/// The variant of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Square,
    Circle,
    Diamond,
    Text,
    Line,
}

impl ShapeKind {
    /// Default `(width, height)` for a freshly created shape of this kind.
    pub fn default_size(self) -> (f64, f64) {
        match self {
            ShapeKind::Text => TEXT_DEFAULT_SIZE,
            ShapeKind::Line => (0.0, 0.0),
            ShapeKind::Rectangle => (SHAPE_DEFAULT_EDGE, RECTANGLE_DEFAULT_HEIGHT),
            ShapeKind::Square | ShapeKind::Circle | ShapeKind::Diamond => {
                (SHAPE_DEFAULT_EDGE, SHAPE_DEFAULT_EDGE)
            }
        }
    }

    /// Whether resizing keeps width and height equal.
    pub fn is_aspect_locked(self) -> bool {
        matches!(self, ShapeKind::Square | ShapeKind::Circle | ShapeKind::Diamond)
    }

    /// Display name used in labels and logs.
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Square => "square",
            ShapeKind::Circle => "circle",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Text => "text",
            ShapeKind::Line => "line",
        }
    }
}

/// A placeable diagram node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: ShapeId,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    /// Top-left anchor, or the start point for lines.
    pub position: Point,
    /// Text label.
    #[serde(default)]
    pub text: String,
    /// Fill color (CSS color string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// End point (lines only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Point>,
    /// Cubic control points, reserved for curved-line dragging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_points: Option<[Point; 2]>,
}

impl Shape {
    /// Create a shape of `kind` at `position` with its default size.
    pub fn new(kind: ShapeKind, position: Point) -> Self {
        let (width, height) = kind.default_size();
        let end = match kind {
            ShapeKind::Line => Some(Point::new(position.x + SHAPE_DEFAULT_EDGE, position.y)),
            _ => None,
        };
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            text: String::new(),
            color: None,
            border_color: None,
            border_width: None,
            width: Some(width),
            height: Some(height),
            end,
            control_points: None,
        }
    }

    /// Set the label.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an explicit size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Width, falling back to the variant default.
    pub fn effective_width(&self) -> f64 {
        self.width.unwrap_or_else(|| self.kind.default_size().0)
    }

    /// Height, falling back to the variant default.
    pub fn effective_height(&self) -> f64 {
        self.height.unwrap_or_else(|| self.kind.default_size().1)
    }

    /// The end point of a line, or `None` for other kinds.
    pub fn line_end(&self) -> Option<Point> {
        match self.kind {
            ShapeKind::Line => Some(self.end.unwrap_or(self.position)),
            _ => None,
        }
    }

    /// Bounding box in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        if let Some(end) = self.line_end() {
            return Rect::from_points(self.position, end);
        }
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.effective_width(),
            self.position.y + self.effective_height(),
        )
    }

    /// Check if a point hits this shape.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if let Some(end) = self.line_end() {
            return point_to_segment_dist(point, self.position, end) <= tolerance;
        }
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    /// Give the shape a fresh identifier.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }
}

/// A partial update to a shape. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapePatch {
    pub position: Option<Point>,
    pub text: Option<String>,
    pub color: Option<String>,
    pub border_color: Option<String>,
    pub border_width: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub end: Option<Point>,
}

impl ShapePatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Returns true if the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write every present field into `shape`.
    pub fn apply(&self, shape: &mut Shape) {
        if let Some(position) = self.position {
            shape.position = position;
        }
        if let Some(text) = &self.text {
            shape.text = text.clone();
        }
        if let Some(color) = &self.color {
            shape.color = Some(color.clone());
        }
        if let Some(border_color) = &self.border_color {
            shape.border_color = Some(border_color.clone());
        }
        if let Some(border_width) = self.border_width {
            shape.border_width = Some(border_width);
        }
        if let Some(width) = self.width {
            shape.width = Some(width);
        }
        if let Some(height) = self.height {
            shape.height = Some(height);
        }
        if let Some(end) = self.end {
            if shape.kind == ShapeKind::Line {
                shape.end = Some(end);
            }
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}
