//! Diagram document: the canonical shape, connection and drawing lists.
//!
//! Mutations are structural primitives. Each returns what it replaced so the
//! caller can build a history entry, and an unknown id is a no-op.

use crate::geometry;
use crate::shapes::{
    ArrowStyle, Connection, ConnectionId, DrawingId, DrawingPath, LineStyle, Shape, ShapeId,
    ShapePatch,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Background color for new diagrams.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";

fn default_background() -> String {
    DEFAULT_BACKGROUND_COLOR.to_string()
}

/// Persisted snapshot and file interchange format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramState {
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub drawings: Vec<DrawingPath>,
    #[serde(default = "default_background")]
    pub background_color: String,
}

impl Default for DiagramState {
    fn default() -> Self {
        Self {
            shapes: Vec::new(),
            connections: Vec::new(),
            drawings: Vec::new(),
            background_color: default_background(),
        }
    }
}

/// Errors when reading a diagram file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid diagram JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Diagram file must be a JSON object")]
    NotAnObject,
}

impl DiagramState {
    /// Serialize to the `.json` file format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a `.json` diagram file. Missing arrays default to empty.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(ImportError::NotAnObject);
        }
        let mut state: Self = serde_json::from_value(value)?;
        state.drawings.retain(|d| !d.is_empty());
        Ok(state)
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.connections.is_empty() && self.drawings.is_empty()
    }
}

/// Store-assigned identity of a persisted diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramIdentity {
    pub id: Option<String>,
    pub share_id: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// A shape removed together with its incident connections.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedShape {
    /// Index the shape occupied in the shape list.
    pub index: usize,
    pub shape: Shape,
    /// Cascaded connections with their former indices, ascending.
    pub connections: Vec<(usize, Connection)>,
}

/// Everything in a diagram except its freehand strokes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramLayout {
    pub shapes: Vec<Shape>,
    pub connections: Vec<Connection>,
    pub background_color: String,
}

impl DiagramLayout {
    /// No shapes or connections on the given background.
    pub fn empty(background_color: impl Into<String>) -> Self {
        Self {
            shapes: Vec::new(),
            connections: Vec::new(),
            background_color: background_color.into(),
        }
    }

    /// The layout part of `state`.
    pub fn of(state: &DiagramState) -> Self {
        Self {
            shapes: state.shapes.clone(),
            connections: state.connections.clone(),
            background_color: state.background_color.clone(),
        }
    }
}

/// Strokes a whole-diagram action took away and brought in.
///
/// Applying and reverting only touch these strokes, so strokes drawn
/// afterwards survive either direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeChange {
    /// Removed strokes with their former indices, ascending.
    pub removed: Vec<(usize, DrawingPath)>,
    pub added: Vec<DrawingPath>,
}

impl StrokeChange {
    /// Remove every current stroke and add `added`.
    pub fn replace_all(doc: &DiagramDocument, added: Vec<DrawingPath>) -> Self {
        Self {
            removed: doc.drawings().iter().cloned().enumerate().collect(),
            added: added.into_iter().filter(|d| !d.is_empty()).collect(),
        }
    }

    /// Keep the current strokes and add `added`.
    pub fn append(added: Vec<DrawingPath>) -> Self {
        Self {
            removed: Vec::new(),
            added: added.into_iter().filter(|d| !d.is_empty()).collect(),
        }
    }

    /// True when the strokes brought in are exactly the strokes taken away.
    pub fn is_noop(&self) -> bool {
        self.removed.iter().map(|(_, d)| d).eq(self.added.iter())
    }

    pub fn apply(&self, doc: &mut DiagramDocument) {
        let removed: Vec<DrawingId> = self.removed.iter().map(|(_, d)| d.id).collect();
        doc.remove_drawings(&removed);
        for path in &self.added {
            if doc.drawing(path.id).is_none() {
                doc.add_drawing(path.clone());
            }
        }
    }

    pub fn revert(&self, doc: &mut DiagramDocument) {
        let added: Vec<DrawingId> = self.added.iter().map(|d| d.id).collect();
        doc.remove_drawings(&added);
        doc.restore_drawings(self.removed.clone());
    }
}

/// The in-memory diagram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramDocument {
    identity: DiagramIdentity,
    state: DiagramState,
}

impl DiagramDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document holding `state`.
    pub fn from_state(state: DiagramState) -> Self {
        Self {
            identity: DiagramIdentity::default(),
            state,
        }
    }

    pub fn identity(&self) -> &DiagramIdentity {
        &self.identity
    }

    /// Replace the persisted identity, returning the previous one.
    pub fn set_identity(&mut self, identity: DiagramIdentity) -> DiagramIdentity {
        std::mem::replace(&mut self.identity, identity)
    }

    /// The current snapshot.
    pub fn state(&self) -> &DiagramState {
        &self.state
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.state.shapes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.state.connections
    }

    pub fn drawings(&self) -> &[DrawingPath] {
        &self.state.drawings
    }

    pub fn background_color(&self) -> &str {
        &self.state.background_color
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Get a shape by ID.
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.state.shapes.iter().find(|s| s.id == id)
    }

    /// Get a connection by ID.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.state.connections.iter().find(|c| c.id == id)
    }

    pub fn drawing(&self, id: DrawingId) -> Option<&DrawingPath> {
        self.state.drawings.iter().find(|d| d.id == id)
    }

    fn shape_index(&self, id: ShapeId) -> Option<usize> {
        self.state.shapes.iter().position(|s| s.id == id)
    }

    fn connection_index(&self, id: ConnectionId) -> Option<usize> {
        self.state.connections.iter().position(|c| c.id == id)
    }

    // -- shapes --------------------------------------------------------------

    /// Append a shape (topmost). Returns its index.
    pub fn add_shape(&mut self, shape: Shape) -> usize {
        self.state.shapes.push(shape);
        self.state.shapes.len() - 1
    }

    /// Insert a shape at `index`, clamped to the list length.
    pub fn insert_shape(&mut self, index: usize, shape: Shape) {
        let index = index.min(self.state.shapes.len());
        self.state.shapes.insert(index, shape);
    }

    /// Apply `patch` to a shape. Returns the shape as it was before.
    pub fn update_shape(&mut self, id: ShapeId, patch: &ShapePatch) -> Option<Shape> {
        let shape = self.state.shapes.iter_mut().find(|s| s.id == id)?;
        let prior = shape.clone();
        patch.apply(shape);
        Some(prior)
    }

    /// Overwrite the shape with the same id. Returns the replaced value.
    pub fn replace_shape(&mut self, shape: Shape) -> Option<Shape> {
        let slot = self.state.shapes.iter_mut().find(|s| s.id == shape.id)?;
        Some(std::mem::replace(slot, shape))
    }

    /// Remove a shape and every connection touching it.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<RemovedShape> {
        let index = self.shape_index(id)?;
        let shape = self.state.shapes.remove(index);

        let mut connections = Vec::new();
        let mut kept = Vec::with_capacity(self.state.connections.len());
        for (i, conn) in self.state.connections.drain(..).enumerate() {
            if conn.touches(id) {
                connections.push((i, conn));
            } else {
                kept.push(conn);
            }
        }
        self.state.connections = kept;

        Some(RemovedShape {
            index,
            shape,
            connections,
        })
    }

    /// Put back a shape removed by [`remove_shape`](Self::remove_shape).
    pub fn restore_shape(&mut self, removed: RemovedShape) {
        self.insert_shape(removed.index, removed.shape);
        for (index, conn) in removed.connections {
            self.insert_connection(index, conn);
        }
    }

    /// Move a shape to `index` in the stacking order. Returns its old index.
    pub fn move_shape_to(&mut self, id: ShapeId, index: usize) -> Option<usize> {
        let old = self.shape_index(id)?;
        let shape = self.state.shapes.remove(old);
        self.insert_shape(index, shape);
        Some(old)
    }

    /// Topmost shape under `point`.
    pub fn shape_at(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        self.state
            .shapes
            .iter()
            .rev()
            .find(|s| s.hit_test(point, tolerance))
            .map(|s| s.id)
    }

    // -- connections ---------------------------------------------------------

    pub fn add_connection(&mut self, connection: Connection) -> usize {
        self.state.connections.push(connection);
        self.state.connections.len() - 1
    }

    pub fn insert_connection(&mut self, index: usize, connection: Connection) {
        let index = index.min(self.state.connections.len());
        self.state.connections.insert(index, connection);
    }

    /// Restyle a connection. Returns the previous `(line, arrow)` styles.
    pub fn update_connection_style(
        &mut self,
        id: ConnectionId,
        line_style: LineStyle,
        arrow_style: ArrowStyle,
    ) -> Option<(LineStyle, ArrowStyle)> {
        let conn = self.state.connections.iter_mut().find(|c| c.id == id)?;
        let prior = (conn.line_style, conn.arrow_style);
        conn.line_style = line_style;
        conn.arrow_style = arrow_style;
        Some(prior)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<(usize, Connection)> {
        let index = self.connection_index(id)?;
        Some((index, self.state.connections.remove(index)))
    }

    /// Topmost connection whose routed path passes within `tolerance`.
    pub fn connection_at(&self, point: Point, tolerance: f64) -> Option<ConnectionId> {
        self.state.connections.iter().rev().find_map(|conn| {
            let path = geometry::connector_path(conn, &self.state.shapes)?;
            (path.distance_to(point) <= tolerance).then_some(conn.id)
        })
    }

    // -- drawings ------------------------------------------------------------

    /// Append a stroke. Empty strokes are rejected.
    pub fn add_drawing(&mut self, path: DrawingPath) -> bool {
        if path.is_empty() {
            return false;
        }
        self.state.drawings.push(path);
        true
    }

    /// Remove every stroke in `ids`. Returns removed strokes with former indices.
    pub fn remove_drawings(&mut self, ids: &[DrawingId]) -> Vec<(usize, DrawingPath)> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.state.drawings.len());
        for (i, path) in self.state.drawings.drain(..).enumerate() {
            if ids.contains(&path.id) {
                removed.push((i, path));
            } else {
                kept.push(path);
            }
        }
        self.state.drawings = kept;
        removed
    }

    /// Put back strokes removed by [`remove_drawings`](Self::remove_drawings).
    /// Strokes whose id is already present are skipped.
    pub fn restore_drawings(&mut self, removed: Vec<(usize, DrawingPath)>) {
        for (index, path) in removed {
            if self.drawing(path.id).is_some() || path.is_empty() {
                continue;
            }
            let index = index.min(self.state.drawings.len());
            self.state.drawings.insert(index, path);
        }
    }

    /// Replace the whole drawing list. Returns the previous list.
    pub fn set_drawings(&mut self, drawings: Vec<DrawingPath>) -> Vec<DrawingPath> {
        std::mem::replace(&mut self.state.drawings, drawings)
    }

    // -- whole document ------------------------------------------------------

    pub fn set_background_color(&mut self, color: impl Into<String>) -> String {
        std::mem::replace(&mut self.state.background_color, color.into())
    }

    pub fn layout(&self) -> DiagramLayout {
        DiagramLayout::of(&self.state)
    }

    /// Swap shapes, connections and background, leaving strokes alone.
    /// Returns the previous layout.
    pub fn replace_layout(&mut self, layout: DiagramLayout) -> DiagramLayout {
        DiagramLayout {
            shapes: std::mem::replace(&mut self.state.shapes, layout.shapes),
            connections: std::mem::replace(&mut self.state.connections, layout.connections),
            background_color: std::mem::replace(
                &mut self.state.background_color,
                layout.background_color,
            ),
        }
    }

    /// Swap in a new snapshot. Returns the old one.
    pub fn replace_all(&mut self, mut snapshot: DiagramState) -> DiagramState {
        snapshot.drawings.retain(|d| !d.is_empty());
        std::mem::replace(&mut self.state, snapshot)
    }
}
