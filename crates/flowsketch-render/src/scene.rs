//! Visual tree built from a diagram snapshot.
//!
//! The scene is a flat list of styled paths in paint order: connectors,
//! then shapes, then freehand strokes. Export backends only need to know
//! how to draw a path and a label.

use crate::color::parse_css_color;
use flowsketch_core::geometry::{self, ConnectorPath};
use flowsketch_core::shapes::{Connection, DrawingPath, Shape, ShapeKind};
use flowsketch_core::{DiagramState, export_bounds};
use kurbo::{BezPath, Ellipse, Point, Rect, Shape as _, Vec2};
use peniko::Color;

/// Length of an arrowhead along the connector.
pub const ARROW_LENGTH: f64 = 12.0;
/// Half the width of an arrowhead's base.
pub const ARROW_HALF_WIDTH: f64 = 5.0;
/// Connector stroke width.
pub const CONNECTOR_WIDTH: f64 = 2.0;
/// Outline width when a shape has no border width.
pub const DEFAULT_BORDER_WIDTH: f64 = 2.0;

const PATH_TOLERANCE: f64 = 0.1;

/// How a path is painted.
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    /// Dash lengths; empty for a solid line.
    pub dash: Vec<f64>,
}

impl PathStyle {
    fn stroked(color: Color, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(color),
            stroke_width: width,
            dash: Vec::new(),
        }
    }
}

/// A text label centered in a box.
#[derive(Debug, Clone)]
pub struct Label {
    pub text: String,
    pub center: Point,
    pub max_width: f64,
    pub color: Color,
}

/// One painted element.
#[derive(Debug, Clone)]
pub struct SceneItem {
    pub path: BezPath,
    pub style: PathStyle,
    pub label: Option<Label>,
}

/// A diagram ready to paint.
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    /// Padded content region, `None` for an empty diagram.
    pub bounds: Option<Rect>,
    pub items: Vec<SceneItem>,
}

/// Build the visual tree for `state`, framed with `padding` and `max_size`.
pub fn build_scene(state: &DiagramState, padding: f64, max_size: f64) -> Scene {
    let mut items = Vec::new();
    for connection in &state.connections {
        items.extend(connector_items(connection, &state.shapes));
    }
    items.extend(state.shapes.iter().map(shape_item));
    items.extend(state.drawings.iter().filter_map(stroke_item));

    Scene {
        background: parse_css_color(&state.background_color),
        bounds: export_bounds(state, padding, max_size),
        items,
    }
}

/// Outline of a shape in canvas coordinates.
pub fn shape_outline(shape: &Shape) -> BezPath {
    let bounds = shape.bounds();
    match shape.kind {
        ShapeKind::Line => {
            let mut path = BezPath::new();
            path.move_to(shape.position);
            path.line_to(shape.line_end().unwrap_or(shape.position));
            path
        }
        ShapeKind::Circle => Ellipse::from_rect(bounds).to_path(PATH_TOLERANCE),
        ShapeKind::Diamond => {
            let c = bounds.center();
            let mut path = BezPath::new();
            path.move_to(Point::new(c.x, bounds.y0));
            path.line_to(Point::new(bounds.x1, c.y));
            path.line_to(Point::new(c.x, bounds.y1));
            path.line_to(Point::new(bounds.x0, c.y));
            path.close_path();
            path
        }
        ShapeKind::Rectangle | ShapeKind::Square | ShapeKind::Text => {
            bounds.to_path(PATH_TOLERANCE)
        }
    }
}

fn shape_item(shape: &Shape) -> SceneItem {
    let border_width = shape.border_width.unwrap_or(DEFAULT_BORDER_WIDTH);
    // Text boxes have no outline unless one is set explicitly.
    let stroke = match (&shape.border_color, shape.kind) {
        (Some(color), _) => Some(parse_css_color(color)),
        (None, ShapeKind::Text) => None,
        (None, _) => Some(Color::BLACK),
    };
    let fill = match shape.kind {
        ShapeKind::Line => None,
        _ => shape.color.as_deref().map(parse_css_color),
    };
    let label = (!shape.text.is_empty()).then(|| Label {
        text: shape.text.clone(),
        center: shape.bounds().center(),
        max_width: shape.effective_width(),
        color: Color::BLACK,
    });
    SceneItem {
        path: shape_outline(shape),
        style: PathStyle {
            fill,
            stroke,
            stroke_width: border_width,
            dash: Vec::new(),
        },
        label,
    }
}

/// The connector line plus any arrowheads. Dangling connections draw nothing.
fn connector_items(connection: &Connection, shapes: &[Shape]) -> Vec<SceneItem> {
    let Some(route) = geometry::connector_path(connection, shapes) else {
        log::debug!("render: skipping dangling connection {}", connection.id);
        return Vec::new();
    };
    let mut items = vec![SceneItem {
        path: route.to_bez_path(),
        style: PathStyle {
            dash: connection.line_style.dash_pattern().to_vec(),
            ..PathStyle::stroked(Color::BLACK, CONNECTOR_WIDTH)
        },
        label: None,
    }];
    items.extend(arrowheads(connection, &route).into_iter().map(|head| SceneItem {
        path: head,
        style: PathStyle {
            fill: Some(Color::BLACK),
            ..PathStyle::stroked(Color::BLACK, 1.0)
        },
        label: None,
    }));
    items
}

fn arrowheads(connection: &Connection, route: &ConnectorPath) -> Vec<BezPath> {
    let mut heads = Vec::new();
    if connection.arrow_style.at_end() {
        if let Some(dir) = route.end_direction() {
            heads.push(arrowhead(route.end, dir));
        }
    }
    if connection.arrow_style.at_start() {
        if let Some(dir) = route.start_direction() {
            heads.push(arrowhead(route.start, dir));
        }
    }
    heads
}

/// Closed triangle with its tip at `tip`, pointing along unit vector `dir`.
pub fn arrowhead(tip: Point, dir: Vec2) -> BezPath {
    let back = tip - dir * ARROW_LENGTH;
    let normal = Vec2::new(-dir.y, dir.x) * ARROW_HALF_WIDTH;
    let mut path = BezPath::new();
    path.move_to(tip);
    path.line_to(back + normal);
    path.line_to(back - normal);
    path.close_path();
    path
}

fn stroke_item(drawing: &DrawingPath) -> Option<SceneItem> {
    let (first, rest) = drawing.points.split_first()?;
    let mut path = BezPath::new();
    path.move_to(first.position());
    for point in rest {
        path.line_to(point.position());
    }
    Some(SceneItem {
        path,
        style: PathStyle::stroked(parse_css_color(&drawing.color), drawing.width),
        label: None,
    })
}
