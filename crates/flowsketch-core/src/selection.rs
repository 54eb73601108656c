//! Selection, resize handles and drag/resize transactions.

use crate::shapes::{ConnectionId, Shape, ShapeId, ShapeKind};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle hit radius in canvas pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;

/// The single current selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    None,
    Shape(ShapeId),
    Connection(ConnectionId),
}

impl Selection {
    pub fn shape(&self) -> Option<ShapeId> {
        match self {
            Selection::Shape(id) => Some(*id),
            _ => None,
        }
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        match self {
            Selection::Connection(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Position of this corner on `bounds`.
    pub fn of(self, bounds: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(bounds.x0, bounds.y0),
            Corner::TopRight => Point::new(bounds.x1, bounds.y0),
            Corner::BottomLeft => Point::new(bounds.x0, bounds.y1),
            Corner::BottomRight => Point::new(bounds.x1, bounds.y1),
        }
    }

    fn grows_left(self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }

    fn grows_up(self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }
}

/// What a pointer gesture on a selected shape does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gesture {
    /// Translate the whole shape. A line moves both of its end points.
    Drag,
    /// Move only the end point of a line, leaving its start in place.
    DragLineEnd,
    /// Resize by dragging a corner; the opposite corner stays fixed.
    Resize(Corner),
}

/// Resize handles of a shape. Lines have none.
pub fn resize_handles(shape: &Shape) -> Vec<(Corner, Point)> {
    if shape.kind == ShapeKind::Line {
        return Vec::new();
    }
    let bounds = shape.bounds();
    Corner::ALL.iter().map(|&c| (c, c.of(bounds))).collect()
}

/// Find which resize handle (if any) is under `point`.
pub fn hit_test_handles(shape: &Shape, point: Point, tolerance: f64) -> Option<Corner> {
    resize_handles(shape)
        .into_iter()
        .find(|(_, pos)| (point - *pos).hypot2() <= tolerance * tolerance)
        .map(|(corner, _)| corner)
}

/// Whether `point` is on the end-point handle of a line.
pub fn hit_test_line_end(shape: &Shape, point: Point, tolerance: f64) -> bool {
    shape
        .line_end()
        .is_some_and(|end| (point - end).hypot2() <= tolerance * tolerance)
}

/// Apply the size rules: aspect-locked kinds take `max(w, h)` on both axes,
/// then both axes are clamped to `min_size`.
pub fn constrain_size(kind: ShapeKind, width: f64, height: f64, min_size: f64) -> (f64, f64) {
    let (w, h) = if kind.is_aspect_locked() {
        let side = width.max(height);
        (side, side)
    } else {
        (width, height)
    };
    (w.max(min_size), h.max(min_size))
}

/// An in-flight drag or resize. Holds the shape as it was at gesture start
/// so the commit can record one history entry.
#[derive(Debug, Clone)]
pub struct ManipulationState {
    /// The shape being manipulated.
    pub shape_id: ShapeId,
    pub gesture: Gesture,
    /// Starting point of the drag.
    pub start_point: Point,
    /// Current point of the drag.
    pub current_point: Point,
    /// Shape state when the gesture began.
    pub original_shape: Shape,
}

impl ManipulationState {
    pub fn new(gesture: Gesture, start_point: Point, original_shape: Shape) -> Self {
        Self {
            shape_id: original_shape.id,
            gesture,
            start_point,
            current_point: start_point,
            original_shape,
        }
    }

    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// The shape as it should look at `current_point`.
    pub fn preview(&self, min_size: f64) -> Shape {
        let mut shape = self.original_shape.clone();
        let delta = self.delta();
        match self.gesture {
            Gesture::Drag => {
                shape.position = self.original_shape.position + delta;
                if let Some(end) = self.original_shape.line_end() {
                    shape.end = Some(end + delta);
                }
            }
            Gesture::DragLineEnd => {
                if let Some(end) = self.original_shape.line_end() {
                    shape.end = Some(end + delta);
                }
            }
            Gesture::Resize(corner) => {
                if shape.kind == ShapeKind::Line {
                    return shape;
                }
                let bounds = self.original_shape.bounds();
                let raw_w = if corner.grows_left() {
                    bounds.width() - delta.x
                } else {
                    bounds.width() + delta.x
                };
                let raw_h = if corner.grows_up() {
                    bounds.height() - delta.y
                } else {
                    bounds.height() + delta.y
                };
                let (w, h) = constrain_size(shape.kind, raw_w, raw_h, min_size);
                let x = if corner.grows_left() { bounds.x1 - w } else { bounds.x0 };
                let y = if corner.grows_up() { bounds.y1 - h } else { bounds.y0 };
                shape.position = Point::new(x, y);
                shape.width = Some(w);
                shape.height = Some(h);
            }
        }
        shape
    }
}
