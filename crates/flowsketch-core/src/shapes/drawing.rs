//! Freehand ink strokes.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for drawing paths.
pub type DrawingId = Uuid;

/// Default stroke color for new strokes.
pub const DEFAULT_STROKE_COLOR: &str = "black";
/// Default stroke width for new strokes.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Where a sample sits within its stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Start,
    Point,
    End,
}

/// One captured pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: PointKind,
}

impl PathPoint {
    pub fn new(position: Point, kind: PointKind) -> Self {
        Self {
            x: position.x,
            y: position.y,
            kind,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A freehand stroke (ordered by capture time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingPath {
    pub id: DrawingId,
    pub points: Vec<PathPoint>,
    pub color: String,
    pub width: f64,
}

impl DrawingPath {
    /// Create a stroke from captured points with the default style.
    pub fn new(points: Vec<PathPoint>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            color: DEFAULT_STROKE_COLOR.to_string(),
            width: DEFAULT_STROKE_WIDTH,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box of the samples, `None` for an empty stroke.
    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?.position();
        Some(
            self.points
                .iter()
                .fold(Rect::from_points(first, first), |rect, p| {
                    rect.union_pt(p.position())
                }),
        )
    }

    /// Whether any sample lies within `tolerance` of `point` on both axes.
    pub fn is_near(&self, point: Point, tolerance: f64) -> bool {
        self.points
            .iter()
            .any(|p| (p.x - point.x).abs() <= tolerance && (p.y - point.y).abs() <= tolerance)
    }
}
