//! Connector routing geometry.
//!
//! Everything here is pure: given shapes, compute where a connector leaves
//! each silhouette and how the path between them is drawn. Degenerate input
//! (coincident points, zero-size shapes) falls back to shape centers rather
//! than producing NaN.

use crate::shapes::{Connection, LineStyle, Shape, ShapeKind};
use kurbo::{BezPath, CubicBez, Line, ParamCurveNearest, Point, Vec2};

/// Below this length a direction vector is treated as zero.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Maximum perpendicular offset of curved connector control points.
pub const CURVE_MAX_OFFSET: f64 = 50.0;
/// Control point offset as a fraction of the chord length.
pub const CURVE_OFFSET_RATIO: f64 = 0.2;

/// Center of the shape's bounding box.
pub fn center_of(shape: &Shape) -> Point {
    Point::new(
        shape.position.x + shape.effective_width() / 2.0,
        shape.position.y + shape.effective_height() / 2.0,
    )
}

/// Point where the ray from the shape's center toward `toward` crosses its outline.
pub fn boundary_intersection(shape: &Shape, toward: Point) -> Point {
    let center = center_of(shape);
    let d = toward - center;
    if d.x.abs() < DEGENERATE_EPSILON && d.y.abs() < DEGENERATE_EPSILON {
        return center;
    }

    let half_w = shape.effective_width() / 2.0;
    let half_h = shape.effective_height() / 2.0;

    match shape.kind {
        ShapeKind::Circle => {
            let angle = d.y.atan2(d.x);
            center + Vec2::new(half_w * angle.cos(), half_w * angle.sin())
        }
        ShapeKind::Diamond => center + diamond_offset(d, half_w, half_h),
        _ => center + box_offset(d, half_w, half_h),
    }
}

/// Offset from the center to the diamond edge along `d`.
///
/// `|tan θ| <= half_h / half_w` means the ray meets an edge closer to the
/// east/west vertex, so we solve for x first; otherwise we solve for y to
/// keep the slope finite.
fn diamond_offset(d: Vec2, half_w: f64, half_h: f64) -> Vec2 {
    if half_w <= DEGENERATE_EPSILON || half_h <= DEGENERATE_EPSILON {
        return Vec2::ZERO;
    }
    let (ax, ay) = (d.x.abs(), d.y.abs());
    let (x, y) = if ax > DEGENERATE_EPSILON && ay * half_w <= half_h * ax {
        let tan = ay / ax;
        let x = half_w * half_h / (half_h + half_w * tan);
        (x, x * tan)
    } else {
        let cot = ax / ay;
        let y = half_w * half_h / (half_w + half_h * cot);
        (y * cot, y)
    };
    Vec2::new(x.copysign(d.x), y.copysign(d.y))
}

/// Offset from the center to the axis-aligned box edge along `d`.
fn box_offset(d: Vec2, half_w: f64, half_h: f64) -> Vec2 {
    if half_w <= DEGENERATE_EPSILON && half_h <= DEGENERATE_EPSILON {
        return Vec2::ZERO;
    }
    let (ax, ay) = (d.x.abs(), d.y.abs());
    if ax > DEGENERATE_EPSILON && ay * half_w <= half_h * ax {
        // East or west edge.
        Vec2::new(half_w.copysign(d.x), half_w * d.y / ax)
    } else {
        // North or south edge.
        Vec2::new(half_h * d.x / ay, half_h.copysign(d.y))
    }
}

/// How the connector between two boundary points is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectorCurve {
    Straight,
    Cubic { c1: Point, c2: Point },
}

/// A resolved connector, ready for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorPath {
    pub start: Point,
    pub end: Point,
    pub curve: ConnectorCurve,
}

impl ConnectorPath {
    /// Build the kurbo path for rendering.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        match self.curve {
            ConnectorCurve::Straight => path.line_to(self.end),
            ConnectorCurve::Cubic { c1, c2 } => path.curve_to(c1, c2, self.end),
        }
        path
    }

    /// Unit direction of travel arriving at `end`, `None` if degenerate.
    pub fn end_direction(&self) -> Option<Vec2> {
        let from = match self.curve {
            ConnectorCurve::Straight => self.start,
            ConnectorCurve::Cubic { c2, .. } => c2,
        };
        normalized(self.end - from)
    }

    /// Unit direction of travel leaving `start` backwards, `None` if degenerate.
    pub fn start_direction(&self) -> Option<Vec2> {
        let from = match self.curve {
            ConnectorCurve::Straight => self.end,
            ConnectorCurve::Cubic { c1, .. } => c1,
        };
        normalized(self.start - from)
    }

    /// Shortest distance from `point` to the drawn path.
    pub fn distance_to(&self, point: Point) -> f64 {
        let nearest = match self.curve {
            ConnectorCurve::Straight => Line::new(self.start, self.end).nearest(point, 1e-6),
            ConnectorCurve::Cubic { c1, c2 } => {
                CubicBez::new(self.start, c1, c2, self.end).nearest(point, 1e-6)
            }
        };
        nearest.distance_sq.sqrt()
    }
}

fn normalized(v: Vec2) -> Option<Vec2> {
    let len = v.hypot();
    if len < DEGENERATE_EPSILON {
        None
    } else {
        Some(v / len)
    }
}

/// Route `connection` between its endpoint shapes.
///
/// Returns `None` when either endpoint no longer exists.
pub fn connector_path(connection: &Connection, shapes: &[Shape]) -> Option<ConnectorPath> {
    let from = shapes.iter().find(|s| s.id == connection.from)?;
    let to = shapes.iter().find(|s| s.id == connection.to)?;

    let start = boundary_intersection(from, center_of(to));
    let end = boundary_intersection(to, center_of(from));

    let curve = match connection.line_style {
        LineStyle::Curved => curve_controls(start, end),
        _ => ConnectorCurve::Straight,
    };
    Some(ConnectorPath { start, end, curve })
}

/// Control points at the 25% and 75% marks, pushed off the chord.
fn curve_controls(start: Point, end: Point) -> ConnectorCurve {
    let chord = end - start;
    let length = chord.hypot();
    let (c1, c2) = (start + chord * 0.25, start + chord * 0.75);
    if length < DEGENERATE_EPSILON {
        return ConnectorCurve::Cubic { c1, c2 };
    }
    let offset = CURVE_MAX_OFFSET.min(CURVE_OFFSET_RATIO * length);
    let normal = Vec2::new(-chord.y / length, chord.x / length) * offset;
    ConnectorCurve::Cubic {
        c1: c1 + normal,
        c2: c2 + normal,
    }
}
