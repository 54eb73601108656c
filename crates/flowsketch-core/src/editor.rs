//! The editing coordinator.
//!
//! [`Editor`] owns the document and both undo logs and is the only place
//! that turns gestures into mutations. Each public mutating method applies
//! its change and records at most one history entry before returning.

use crate::config::EditorConfig;
use crate::document::{
    DiagramDocument, DiagramIdentity, DiagramLayout, DiagramState, ImportError, StrokeChange,
};
use crate::drawing::{DrawingEngine, DrawingOutcome, DrawingTool};
use crate::export;
use crate::history::{ActionKind, History, HistoryAction};
use crate::input::{KeyCommand, Modifiers, ShortcutRegistry};
use crate::request::{RequestKind, RequestTicket, RequestTracker};
use crate::router::ConnectionRouter;
use crate::selection::{Corner, Gesture, ManipulationState, Selection, constrain_size};
use crate::session::{AnonymousSession, SessionContext};
use crate::shapes::{
    ArrowStyle, Connection, ConnectionId, LineStyle, Shape, ShapeId, ShapeKind, ShapePatch,
};
use crate::storage::{
    DiagramStore, SaveReceipt, ShareLink, ShareMode, StorageError, StorageResult, StoredDiagram,
};
use crate::suggest::{Suggestion, SuggestionError, SuggestionMode, SuggestionSource};
use crate::text_edit::{TextEditResult, TextEditState, TextKey, TextModifiers};
use kurbo::{Point, Rect};
use serde_json::json;
use std::collections::HashMap;

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the host to show, e.g. as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Everything needed to run a save outside the editor.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub ticket: RequestTicket,
    pub id: Option<String>,
    pub owner: Option<String>,
    pub state: DiagramState,
}

/// Per-process counter hashed into placement coordinates.
fn placement_seed() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static SEED_COUNTER: AtomicU32 = AtomicU32::new(1);
    let counter = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut x = counter.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

fn unit_random() -> f64 {
    f64::from(placement_seed()) / f64::from(u32::MAX)
}

/// Diagram editor state and operations.
pub struct Editor {
    config: EditorConfig,
    document: DiagramDocument,
    history: History,
    router: ConnectionRouter,
    drawing: DrawingEngine,
    selection: Selection,
    /// In-flight drag or resize.
    manipulation: Option<ManipulationState>,
    text_edit: Option<TextEditState>,
    session: Box<dyn SessionContext>,
    requests: RequestTracker,
    notices: Vec<Notice>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Create an editor for an anonymous user.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_session(config, Box::new(AnonymousSession))
    }

    pub fn with_session(config: EditorConfig, session: Box<dyn SessionContext>) -> Self {
        let mut document = DiagramDocument::new();
        document.set_background_color(config.background_color.clone());
        let mut drawing = DrawingEngine::new(&config);
        drawing.reset_history(&document);
        Self {
            config,
            document,
            history: History::new(),
            router: ConnectionRouter::new(),
            drawing,
            selection: Selection::None,
            manipulation: None,
            text_edit: None,
            session,
            requests: RequestTracker::new(),
            notices: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &DiagramDocument {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn router(&self) -> &ConnectionRouter {
        &self.router
    }

    pub fn drawing(&self) -> &DrawingEngine {
        &self.drawing
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn manipulation(&self) -> Option<&ManipulationState> {
        self.manipulation.as_ref()
    }

    pub fn text_edit(&self) -> Option<&TextEditState> {
        self.text_edit.as_ref()
    }

    pub fn identity(&self) -> &DiagramIdentity {
        self.document.identity()
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Drain queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // -- shapes --------------------------------------------------------------

    /// Add a shape of `kind`. Without a position it lands somewhere random
    /// inside the visible canvas.
    pub fn add_shape(&mut self, kind: ShapeKind, position: Option<Point>) -> ShapeId {
        let position = position.unwrap_or_else(|| self.random_position(kind));
        self.place_shape(Shape::new(kind, position))
    }

    /// Add a fully built shape as one history entry and select it.
    pub fn place_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id;
        let index = self.document.add_shape(shape.clone());
        let payload = json!({ "id": id.to_string(), "type": shape.kind.name() });
        self.history.record(HistoryAction::new(
            ActionKind::AddShape,
            payload,
            move |doc| {
                doc.remove_shape(id);
            },
            move |doc| doc.insert_shape(index, shape.clone()),
        ));
        self.selection = Selection::Shape(id);
        id
    }

    fn random_position(&self, kind: ShapeKind) -> Point {
        let (w, h) = match kind {
            ShapeKind::Line => (crate::shapes::SHAPE_DEFAULT_EDGE, 0.0),
            _ => kind.default_size(),
        };
        let max_x = (self.config.canvas_width - w).max(0.0);
        let max_y = (self.config.canvas_height - h).max(0.0);
        Point::new((unit_random() * max_x).round(), (unit_random() * max_y).round())
    }

    /// Click on a shape. In connect mode this feeds the router and returns
    /// the connection created when the gesture completes.
    pub fn select_shape(&mut self, id: ShapeId) -> Option<ConnectionId> {
        if self.document.shape(id).is_none() {
            return None;
        }
        if self.text_edit.as_ref().is_some_and(|t| t.shape_id() != id) {
            self.commit_text_edit();
        }
        if self.router.is_active() {
            let request = self.router.select_shape(id)?;
            return self.connect(request.from, request.to);
        }
        self.selection = Selection::Shape(id);
        None
    }

    pub fn select_connection(&mut self, id: ConnectionId) -> bool {
        if self.document.connection(id).is_none() {
            return false;
        }
        self.commit_text_edit();
        self.selection = Selection::Connection(id);
        true
    }

    /// Click on empty canvas: commit any edit, leave connect mode, deselect.
    pub fn click_canvas(&mut self) {
        self.commit_text_edit();
        self.router.cancel();
        self.selection = Selection::None;
    }

    /// Resolve a click at `point` to a shape, a connection or empty canvas.
    pub fn click_at(&mut self, point: Point) -> Selection {
        let tolerance = self.config.hit_tolerance;
        if let Some(id) = self.document.shape_at(point, tolerance) {
            self.select_shape(id);
        } else if let Some(id) = self.document.connection_at(point, tolerance) {
            self.select_connection(id);
        } else {
            self.click_canvas();
        }
        self.selection
    }

    /// Move a shape to `position` as one history entry. A line keeps its
    /// length and direction.
    pub fn move_shape(&mut self, id: ShapeId, position: Point) -> bool {
        let Some(shape) = self.document.shape(id) else {
            return false;
        };
        let patch = ShapePatch {
            end: shape.line_end().map(|end| end + (position - shape.position)),
            ..ShapePatch::position(position)
        };
        self.patch_shape(id, ActionKind::MoveShape, &patch)
    }

    /// Resize a shape as one history entry, applying the size rules.
    pub fn resize_shape(&mut self, id: ShapeId, width: f64, height: f64) -> bool {
        let Some(kind) = self.document.shape(id).map(|s| s.kind) else {
            return false;
        };
        if kind == ShapeKind::Line {
            return false;
        }
        let (w, h) = constrain_size(kind, width, height, self.config.min_shape_size);
        self.patch_shape(id, ActionKind::ResizeShape, &ShapePatch::size(w, h))
    }

    /// Replace a shape's label as one history entry.
    pub fn set_shape_text(&mut self, id: ShapeId, text: impl Into<String>) -> bool {
        self.patch_shape(id, ActionKind::UpdateText, &ShapePatch::text(text))
    }

    pub fn set_shape_color(&mut self, id: ShapeId, color: impl Into<String>) -> bool {
        let patch = ShapePatch {
            color: Some(color.into()),
            ..ShapePatch::default()
        };
        self.patch_shape(id, ActionKind::UpdateColor, &patch)
    }

    pub fn set_border_color(&mut self, id: ShapeId, color: impl Into<String>) -> bool {
        let patch = ShapePatch {
            border_color: Some(color.into()),
            ..ShapePatch::default()
        };
        self.patch_shape(id, ActionKind::UpdateBorderColor, &patch)
    }

    pub fn set_border_width(&mut self, id: ShapeId, width: f64) -> bool {
        let patch = ShapePatch {
            border_width: Some(width.max(0.0)),
            ..ShapePatch::default()
        };
        self.patch_shape(id, ActionKind::UpdateBorderWidth, &patch)
    }

    fn patch_shape(&mut self, id: ShapeId, kind: ActionKind, patch: &ShapePatch) -> bool {
        let Some(before) = self.document.update_shape(id, patch) else {
            return false;
        };
        let Some(after) = self.document.shape(id).cloned() else {
            return false;
        };
        if before == after {
            return false;
        }
        self.record_shape_change(kind, before, after);
        true
    }

    fn record_shape_change(&mut self, kind: ActionKind, before: Shape, after: Shape) {
        let payload = json!({ "id": after.id.to_string() });
        self.history.record(HistoryAction::new(
            kind,
            payload,
            move |doc| {
                doc.replace_shape(before.clone());
            },
            move |doc| {
                doc.replace_shape(after.clone());
            },
        ));
    }

    pub fn bring_to_front(&mut self, id: ShapeId) -> bool {
        let top = self.document.shapes().len().saturating_sub(1);
        self.reorder_shape(id, top)
    }

    pub fn send_to_back(&mut self, id: ShapeId) -> bool {
        self.reorder_shape(id, 0)
    }

    fn reorder_shape(&mut self, id: ShapeId, index: usize) -> bool {
        let Some(old) = self.document.move_shape_to(id, index) else {
            return false;
        };
        if old == index {
            return false;
        }
        let payload = json!({ "id": id.to_string(), "from": old, "to": index });
        self.history.record(HistoryAction::new(
            ActionKind::ReorderShape,
            payload,
            move |doc| {
                doc.move_shape_to(id, old);
            },
            move |doc| {
                doc.move_shape_to(id, index);
            },
        ));
        true
    }

    // -- drag and resize -----------------------------------------------------

    /// Start dragging a whole shape.
    pub fn begin_drag(&mut self, id: ShapeId, point: Point) -> bool {
        self.begin_gesture(id, Gesture::Drag, point)
    }

    /// Start dragging the end point of a line. Other kinds are rejected.
    pub fn begin_line_end_drag(&mut self, id: ShapeId, point: Point) -> bool {
        if self.document.shape(id).and_then(Shape::line_end).is_none() {
            return false;
        }
        self.begin_gesture(id, Gesture::DragLineEnd, point)
    }

    /// Start resizing a shape from one of its corners. Lines cannot be resized.
    pub fn begin_resize(&mut self, id: ShapeId, corner: Corner, point: Point) -> bool {
        if self.document.shape(id).is_some_and(|s| s.kind == ShapeKind::Line) {
            return false;
        }
        self.begin_gesture(id, Gesture::Resize(corner), point)
    }

    fn begin_gesture(&mut self, id: ShapeId, gesture: Gesture, point: Point) -> bool {
        self.commit_gesture();
        self.commit_text_edit();
        let Some(shape) = self.document.shape(id).cloned() else {
            return false;
        };
        log::debug!("editor: begin {gesture:?} on {id}");
        self.selection = Selection::Shape(id);
        self.manipulation = Some(ManipulationState::new(gesture, point, shape));
        true
    }

    /// Live update of the current gesture. Nothing is recorded.
    pub fn update_gesture(&mut self, point: Point) -> bool {
        let Some(state) = self.manipulation.as_mut() else {
            return false;
        };
        state.current_point = point;
        let preview = state.preview(self.config.min_shape_size);
        self.document.replace_shape(preview).is_some()
    }

    /// Finish the gesture as one `MoveShape` or `ResizeShape` entry, or no
    /// entry when the shape ended where it started.
    pub fn commit_gesture(&mut self) -> Option<ActionKind> {
        let state = self.manipulation.take()?;
        let after = self.document.shape(state.shape_id)?.clone();
        if after == state.original_shape {
            return None;
        }
        let kind = match state.gesture {
            Gesture::Drag | Gesture::DragLineEnd => ActionKind::MoveShape,
            Gesture::Resize(_) => ActionKind::ResizeShape,
        };
        self.record_shape_change(kind, state.original_shape, after);
        Some(kind)
    }

    /// Abandon the gesture and put the shape back.
    pub fn cancel_gesture(&mut self) {
        if let Some(state) = self.manipulation.take() {
            self.document.replace_shape(state.original_shape);
        }
    }

    // -- text editing --------------------------------------------------------

    pub fn begin_text_edit(&mut self, id: ShapeId) -> bool {
        self.commit_gesture();
        self.commit_text_edit();
        let Some(shape) = self.document.shape(id) else {
            return false;
        };
        self.text_edit = Some(TextEditState::new(shape));
        self.selection = Selection::Shape(id);
        true
    }

    /// Route a key to the label editor.
    pub fn text_key(&mut self, key: TextKey, modifiers: TextModifiers) -> TextEditResult {
        let Some(state) = self.text_edit.as_mut() else {
            return TextEditResult::NotHandled;
        };
        let result = state.handle_key(key, modifiers);
        match result {
            TextEditResult::Commit => {
                self.commit_text_edit();
            }
            TextEditResult::Cancel => self.text_edit = None,
            TextEditResult::Handled | TextEditResult::NotHandled => {}
        }
        result
    }

    /// Finish editing (also used on blur). Records `UpdateText` if the
    /// label changed.
    pub fn commit_text_edit(&mut self) -> bool {
        let Some(state) = self.text_edit.take() else {
            return false;
        };
        if !state.is_changed() {
            return false;
        }
        self.set_shape_text(state.shape_id(), state.text())
    }

    // -- connections ---------------------------------------------------------

    /// Toggle connect mode. Returns whether it is now on.
    pub fn toggle_connect_mode(&mut self) -> bool {
        self.commit_text_edit();
        self.router.toggle()
    }

    /// Connect two shapes with the default style as one history entry.
    pub fn connect(&mut self, from: ShapeId, to: ShapeId) -> Option<ConnectionId> {
        if from == to || self.document.shape(from).is_none() || self.document.shape(to).is_none() {
            return None;
        }
        let connection = Connection::new(from, to);
        let id = connection.id;
        let index = self.document.add_connection(connection.clone());
        let payload = json!({ "id": id.to_string(), "from": from.to_string(), "to": to.to_string() });
        self.history.record(HistoryAction::new(
            ActionKind::AddConnection,
            payload,
            move |doc| {
                doc.remove_connection(id);
            },
            move |doc| doc.insert_connection(index, connection.clone()),
        ));
        self.selection = Selection::Connection(id);
        Some(id)
    }

    pub fn set_connection_style(
        &mut self,
        id: ConnectionId,
        line_style: LineStyle,
        arrow_style: ArrowStyle,
    ) -> bool {
        let Some(old) = self
            .document
            .update_connection_style(id, line_style, arrow_style)
        else {
            return false;
        };
        if old == (line_style, arrow_style) {
            return false;
        }
        let payload = json!({
            "id": id.to_string(),
            "from": { "lineStyle": old.0, "arrowStyle": old.1 },
            "to": { "lineStyle": line_style, "arrowStyle": arrow_style },
        });
        self.history.record(HistoryAction::new(
            ActionKind::UpdateConnectionStyle,
            payload,
            move |doc| {
                doc.update_connection_style(id, old.0, old.1);
            },
            move |doc| {
                doc.update_connection_style(id, line_style, arrow_style);
            },
        ));
        true
    }

    // -- deletion and whole-diagram changes ----------------------------------

    /// Delete whatever is selected as one history entry.
    pub fn delete_selected(&mut self) -> bool {
        match self.selection {
            Selection::Shape(id) => self.delete_shape(id),
            Selection::Connection(id) => self.delete_connection(id),
            Selection::None => false,
        }
    }

    /// Delete a shape and its connections as one history entry.
    pub fn delete_shape(&mut self, id: ShapeId) -> bool {
        if self.manipulation.as_ref().is_some_and(|m| m.shape_id == id) {
            self.cancel_gesture();
        }
        if self.text_edit.as_ref().is_some_and(|t| t.shape_id() == id) {
            self.text_edit = None;
        }
        let Some(removed) = self.document.remove_shape(id) else {
            return false;
        };
        let payload = json!({
            "id": id.to_string(),
            "connections": removed.connections.len(),
        });
        self.history.record(HistoryAction::new(
            ActionKind::DeleteShape,
            payload,
            move |doc| doc.restore_shape(removed.clone()),
            move |doc| {
                doc.remove_shape(id);
            },
        ));
        self.prune_transient_state();
        true
    }

    pub fn delete_connection(&mut self, id: ConnectionId) -> bool {
        let Some((index, connection)) = self.document.remove_connection(id) else {
            return false;
        };
        self.history.record(HistoryAction::new(
            ActionKind::DeleteConnection,
            json!({ "id": id.to_string() }),
            move |doc| doc.insert_connection(index, connection.clone()),
            move |doc| {
                doc.remove_connection(id);
            },
        ));
        self.prune_transient_state();
        true
    }

    pub fn set_background_color(&mut self, color: impl Into<String>) -> bool {
        let color = color.into();
        if self.document.background_color() == color {
            return false;
        }
        let old = self.document.set_background_color(color.clone());
        let payload = json!({ "from": old, "to": color });
        self.history.record(HistoryAction::new(
            ActionKind::UpdateBackground,
            payload,
            move |doc| {
                doc.set_background_color(old.clone());
            },
            move |doc| {
                doc.set_background_color(color.clone());
            },
        ));
        true
    }

    /// Remove every shape, connection and stroke and forget the persisted
    /// identity, as one entry whose undo restores them. The background stays.
    pub fn clear_screen(&mut self) -> bool {
        self.cancel_transient_state();
        let identity = self.document.identity().clone();
        if self.document.is_empty() && identity == DiagramIdentity::default() {
            return false;
        }
        let before = self.document.layout();
        let payload = json!({
            "shapes": before.shapes.len(),
            "connections": before.connections.len(),
            "drawings": self.document.drawings().len(),
        });
        let swap = DiagramSwap {
            after: DiagramLayout::empty(before.background_color.clone()),
            before,
            identity: Some((identity, DiagramIdentity::default())),
            strokes: StrokeChange::replace_all(&self.document, Vec::new()),
        };
        self.record_swap(ActionKind::ClearScreen, payload, swap);
        true
    }

    /// Apply `swap` now and record it as one entry.
    fn record_swap(&mut self, kind: ActionKind, payload: serde_json::Value, swap: DiagramSwap) {
        swap.apply(&mut self.document);
        let redo = swap.clone();
        self.history.record(HistoryAction::new(
            kind,
            payload,
            move |doc| swap.revert(doc),
            move |doc| redo.apply(doc),
        ));
    }

    // -- history -------------------------------------------------------------

    pub fn undo(&mut self) -> Option<ActionKind> {
        self.cancel_gesture();
        self.text_edit = None;
        let kind = self.history.undo(&mut self.document)?;
        self.prune_transient_state();
        Some(kind)
    }

    pub fn redo(&mut self) -> Option<ActionKind> {
        self.cancel_gesture();
        self.text_edit = None;
        let kind = self.history.redo(&mut self.document)?;
        self.prune_transient_state();
        Some(kind)
    }

    /// Drop selection and pending gestures that point at missing elements.
    fn prune_transient_state(&mut self) {
        let stale = match self.selection {
            Selection::Shape(id) => self.document.shape(id).is_none(),
            Selection::Connection(id) => self.document.connection(id).is_none(),
            Selection::None => false,
        };
        if stale {
            self.selection = Selection::None;
        }
        if let crate::router::RouterState::AwaitingSecondShape(first) = self.router.state() {
            if self.document.shape(first).is_none() {
                self.router.cancel();
            }
        }
    }

    fn cancel_transient_state(&mut self) {
        self.cancel_gesture();
        self.text_edit = None;
        self.router.cancel();
        self.selection = Selection::None;
    }

    // -- freehand ------------------------------------------------------------

    pub fn set_drawing_tool(&mut self, tool: DrawingTool) {
        if tool != DrawingTool::Off {
            self.commit_gesture();
            self.commit_text_edit();
            self.router.cancel();
        }
        self.drawing.set_tool(tool);
    }

    pub fn set_stroke_style(&mut self, color: impl Into<String>, width: f64) {
        self.drawing.set_stroke_style(color, width);
    }

    pub fn drawing_pointer_down(&mut self, point: Point) -> DrawingOutcome {
        self.drawing.pointer_down(&mut self.document, point)
    }

    pub fn drawing_pointer_move(&mut self, point: Point) -> DrawingOutcome {
        self.drawing.pointer_move(&mut self.document, point)
    }

    pub fn drawing_pointer_up(&mut self) -> DrawingOutcome {
        self.drawing.pointer_up(&mut self.document)
    }

    pub fn drawing_undo(&mut self) -> bool {
        self.drawing.undo(&mut self.document)
    }

    pub fn drawing_redo(&mut self) -> bool {
        self.drawing.redo(&mut self.document)
    }

    // -- keyboard ------------------------------------------------------------

    /// Run the command bound to a key chord. Keys are left alone while a
    /// label is being edited; send those to [`text_key`](Self::text_key).
    pub fn handle_shortcut(&mut self, key: &str, modifiers: Modifiers) -> Option<KeyCommand> {
        if self.text_edit.is_some() {
            return None;
        }
        let drawing_active = self.drawing.tool() != DrawingTool::Off;
        let command = ShortcutRegistry::resolve(key, modifiers, drawing_active)?;
        match command {
            KeyCommand::Undo => {
                self.undo();
            }
            KeyCommand::Redo => {
                self.redo();
            }
            KeyCommand::DrawingUndo => {
                self.drawing_undo();
            }
            KeyCommand::DrawingRedo => {
                self.drawing_redo();
            }
            KeyCommand::DeleteSelection => {
                self.delete_selected();
            }
            KeyCommand::Cancel => {
                self.cancel_transient_state();
                self.drawing.set_tool(DrawingTool::Off);
            }
        }
        Some(command)
    }

    // -- files ---------------------------------------------------------------

    /// Serialize the diagram to the `.json` file format.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        self.document.state().to_json()
    }

    /// Replace the diagram with a `.json` file. On failure the current
    /// diagram is untouched and an error notice is queued.
    pub fn import_json(&mut self, json: &str) -> Result<(), ImportError> {
        match DiagramState::from_json(json) {
            Ok(state) => {
                self.load_state(state, DiagramIdentity::default());
                Ok(())
            }
            Err(e) => {
                log::warn!("editor: rejected diagram file: {e}");
                self.notices.push(Notice::error(format!("Could not open file: {e}")));
                Err(e)
            }
        }
    }

    /// Swap in a loaded diagram and restart both undo logs.
    fn load_state(&mut self, state: DiagramState, identity: DiagramIdentity) {
        self.cancel_transient_state();
        self.document.replace_all(state);
        self.document.set_identity(identity);
        self.history.clear();
        self.drawing.reset_history(&self.document);
        log::info!(
            "editor: loaded diagram with {} shapes",
            self.document.shapes().len()
        );
    }

    /// Padded region covering the content, or `None` when empty.
    pub fn export_bounds(&self) -> Option<Rect> {
        export::export_bounds(
            self.document.state(),
            self.config.export_padding,
            self.config.export_max_size,
        )
    }

    // -- requests ------------------------------------------------------------

    /// Start a collaborator call, or `None` while one of this kind is running.
    pub fn begin_request(&mut self, kind: RequestKind) -> Option<RequestTicket> {
        self.requests.begin(kind)
    }

    /// Close a call. False means the response is stale and must be dropped.
    pub fn finish_request(&mut self, ticket: RequestTicket) -> bool {
        self.requests.finish(ticket)
    }

    pub fn is_request_pending(&self, kind: RequestKind) -> bool {
        self.requests.is_pending(kind)
    }

    /// The view is going away; late responses are ignored from now on.
    pub fn unmount(&mut self) {
        self.requests.unmount();
        self.cancel_transient_state();
    }

    // -- persistence ---------------------------------------------------------

    pub fn prepare_save(&mut self) -> Option<SaveRequest> {
        self.commit_gesture();
        self.commit_text_edit();
        let ticket = self.requests.begin(RequestKind::Save)?;
        Some(SaveRequest {
            ticket,
            id: self.document.identity().id.clone(),
            owner: self.session.current_user_id(),
            state: self.document.state().clone(),
        })
    }

    /// Apply a save response. Returns the receipt when it was accepted.
    pub fn complete_save(
        &mut self,
        ticket: RequestTicket,
        result: StorageResult<SaveReceipt>,
    ) -> Option<SaveReceipt> {
        if !self.requests.finish(ticket) {
            return None;
        }
        match result {
            Ok(receipt) => {
                let is_public = self.document.identity().is_public;
                self.document.set_identity(DiagramIdentity {
                    id: Some(receipt.id.clone()),
                    share_id: Some(receipt.share_id.clone()),
                    is_public,
                });
                self.notices.push(Notice::info("Diagram saved"));
                Some(receipt)
            }
            Err(e) => {
                log::warn!("editor: save failed: {e}");
                self.notices.push(Notice::error(format!("Save failed: {e}")));
                None
            }
        }
    }

    /// Save through `store`.
    pub async fn save(&mut self, store: &dyn DiagramStore) -> Option<SaveReceipt> {
        let request = self.prepare_save()?;
        let result = store
            .save_diagram(request.id.as_deref(), request.owner.as_deref(), &request.state)
            .await;
        self.complete_save(request.ticket, result)
    }

    /// Apply a load response. On failure the diagram is untouched.
    pub fn complete_load(
        &mut self,
        ticket: RequestTicket,
        result: StorageResult<StoredDiagram>,
    ) -> bool {
        if !self.requests.finish(ticket) {
            return false;
        }
        match result {
            Ok(stored) => {
                let identity = stored.identity();
                self.load_state(stored.state, identity);
                true
            }
            Err(e) => {
                log::warn!("editor: load failed: {e}");
                let message = match e {
                    StorageError::NotFound(_) => "Diagram not found".to_string(),
                    StorageError::PermissionDenied(_) => "This diagram is private".to_string(),
                    e => format!("Could not load diagram: {e}"),
                };
                self.notices.push(Notice::error(message));
                false
            }
        }
    }

    /// Load a saved diagram by id.
    pub async fn load(&mut self, store: &dyn DiagramStore, id: &str) -> bool {
        let Some(ticket) = self.requests.begin(RequestKind::Load) else {
            return false;
        };
        let result = store.load_diagram(id).await;
        self.complete_load(ticket, result)
    }

    /// Open a `/view/...` or `/collaborate/...` link.
    pub async fn open_share_link(&mut self, store: &dyn DiagramStore, link: &str) -> bool {
        let Some(link) = ShareLink::parse(link) else {
            self.notices.push(Notice::error("Not a diagram link"));
            return false;
        };
        let Some(ticket) = self.requests.begin(RequestKind::Load) else {
            return false;
        };
        let result = store.load_shared(&link.share_id).await;
        self.complete_load(ticket, result)
    }

    /// Link for sharing the saved diagram.
    pub fn share_link(&self, mode: ShareMode) -> Option<ShareLink> {
        let share_id = self.document.identity().share_id.as_ref()?;
        Some(ShareLink::new(mode, share_id.clone()))
    }

    pub fn complete_visibility(
        &mut self,
        ticket: RequestTicket,
        is_public: bool,
        result: StorageResult<()>,
    ) -> bool {
        if !self.requests.finish(ticket) {
            return false;
        }
        match result {
            Ok(()) => {
                let mut identity = self.document.identity().clone();
                identity.is_public = is_public;
                self.document.set_identity(identity);
                true
            }
            Err(e) => {
                log::warn!("editor: visibility change failed: {e}");
                self.notices
                    .push(Notice::error(format!("Could not change sharing: {e}")));
                false
            }
        }
    }

    /// Make the saved diagram public or private.
    pub async fn set_visibility(&mut self, store: &dyn DiagramStore, is_public: bool) -> bool {
        let Some(id) = self.document.identity().id.clone() else {
            self.notices
                .push(Notice::error("Save the diagram before sharing it"));
            return false;
        };
        let Some(ticket) = self.requests.begin(RequestKind::Visibility) else {
            return false;
        };
        let result = store.set_visibility(&id, is_public).await;
        self.complete_visibility(ticket, is_public, result)
    }

    // -- suggestions ---------------------------------------------------------

    /// Apply a suggested diagram as one history entry.
    ///
    /// `Replace` swaps the whole diagram; `Merge` appends the suggested
    /// elements under fresh ids.
    pub fn apply_suggestion(&mut self, suggestion: Suggestion) -> bool {
        self.cancel_transient_state();
        let mode = suggestion.mode;
        let incoming = suggestion.state;
        let before = self.document.layout();
        let (after, strokes) = match mode {
            SuggestionMode::Replace => (
                DiagramLayout::of(&incoming),
                StrokeChange::replace_all(&self.document, incoming.drawings),
            ),
            SuggestionMode::Merge => merge_suggestion(&before, incoming),
        };
        if after == before && strokes.is_noop() {
            return false;
        }
        let payload = json!({
            "mode": mode,
            "shapes": after.shapes.len(),
            "drawings": strokes.added.len(),
        });
        let swap = DiagramSwap {
            before,
            after,
            identity: None,
            strokes,
        };
        self.record_swap(ActionKind::ApplySuggestion, payload, swap);
        true
    }

    /// Ask `source` for a diagram and apply it.
    pub async fn request_suggestion(&mut self, source: &dyn SuggestionSource, prompt: &str) -> bool {
        let Some(ticket) = self.requests.begin(RequestKind::Suggest) else {
            return false;
        };
        let result = source.suggest(prompt).await;
        self.complete_suggestion(ticket, result)
    }

    pub fn complete_suggestion(
        &mut self,
        ticket: RequestTicket,
        result: Result<Suggestion, SuggestionError>,
    ) -> bool {
        if !self.requests.finish(ticket) {
            return false;
        }
        match result {
            Ok(suggestion) => self.apply_suggestion(suggestion),
            Err(e) => {
                log::warn!("editor: suggestion failed: {e}");
                self.notices.push(Notice::error(format!("Suggestion failed: {e}")));
                false
            }
        }
    }
}

/// A whole-diagram change. Strokes are tracked individually so strokes
/// drawn after the change are left alone by undo and redo.
#[derive(Debug, Clone)]
struct DiagramSwap {
    before: DiagramLayout,
    after: DiagramLayout,
    /// `(before, after)` when the change also swaps the persisted identity.
    identity: Option<(DiagramIdentity, DiagramIdentity)>,
    strokes: StrokeChange,
}

impl DiagramSwap {
    fn apply(&self, doc: &mut DiagramDocument) {
        doc.replace_layout(self.after.clone());
        if let Some((_, after)) = &self.identity {
            doc.set_identity(after.clone());
        }
        self.strokes.apply(doc);
    }

    fn revert(&self, doc: &mut DiagramDocument) {
        doc.replace_layout(self.before.clone());
        if let Some((before, _)) = &self.identity {
            doc.set_identity(before.clone());
        }
        self.strokes.revert(doc);
    }
}

/// Append `incoming` to `base`, re-keying every element so ids stay unique.
/// The background is kept; suggested strokes are added on top.
fn merge_suggestion(base: &DiagramLayout, incoming: DiagramState) -> (DiagramLayout, StrokeChange) {
    let mut merged = base.clone();
    let mut remap: HashMap<ShapeId, ShapeId> = HashMap::new();
    for mut shape in incoming.shapes {
        let old = shape.id;
        shape.regenerate_id();
        remap.insert(old, shape.id);
        merged.shapes.push(shape);
    }
    for mut connection in incoming.connections {
        let (Some(&from), Some(&to)) = (remap.get(&connection.from), remap.get(&connection.to))
        else {
            continue;
        };
        connection.id = uuid::Uuid::new_v4();
        connection.from = from;
        connection.to = to;
        merged.connections.push(connection);
    }
    let strokes = incoming
        .drawings
        .into_iter()
        .map(|mut path| {
            path.id = uuid::Uuid::new_v4();
            path
        })
        .collect();
    (merged, StrokeChange::append(strokes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;
    use crate::session::UserSession;
    use crate::storage::MemoryStore;
    use pollster::block_on;

    fn editor() -> Editor {
        Editor::default()
    }

    #[test]
    fn test_add_shape_defaults_and_random_placement() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Text, None);
        let shape = ed.document().shape(id).unwrap();
        assert_eq!((shape.width, shape.height), (Some(200.0), Some(100.0)));
        assert!(shape.position.x >= 0.0 && shape.position.x <= 1000.0);
        assert!(shape.position.y >= 0.0 && shape.position.y <= 700.0);
        assert_eq!(ed.selection(), Selection::Shape(id));
        assert_eq!(ed.history().kinds().collect::<Vec<_>>(), vec![ActionKind::AddShape]);
    }

    #[test]
    fn test_round_trip_many_actions() {
        let mut ed = editor();
        let initial = ed.document().clone();

        let a = ed.add_shape(ShapeKind::Rectangle, Some(Point::new(0.0, 0.0)));
        let b = ed.add_shape(ShapeKind::Circle, Some(Point::new(300.0, 0.0)));
        ed.move_shape(a, Point::new(20.0, 40.0));
        ed.set_shape_color(b, "#ffcc00");
        ed.set_border_width(a, 3.0);
        let c = ed.connect(a, b).unwrap();
        ed.set_connection_style(c, LineStyle::Curved, ArrowStyle::Both);
        ed.set_background_color("#eeeeee");
        ed.bring_to_front(a);
        ed.delete_shape(b);
        let edited = ed.document().clone();
        let n = ed.history().len();
        assert_eq!(n, 10);

        for _ in 0..n {
            assert!(ed.undo().is_some());
        }
        assert_eq!(ed.document(), &initial);
        assert!(ed.undo().is_none());

        for _ in 0..n {
            assert!(ed.redo().is_some());
        }
        assert_eq!(ed.document(), &edited);
        assert!(ed.redo().is_none());
    }

    #[test]
    fn test_connect_scenario() {
        let mut ed = editor();
        let rect = ed.place_shape(
            Shape::new(ShapeKind::Rectangle, Point::new(100.0, 100.0)).with_size(128.0, 128.0),
        );
        let circle = ed.add_shape(ShapeKind::Circle, Some(Point::new(400.0, 100.0)));

        assert!(ed.toggle_connect_mode());
        assert!(ed.select_shape(rect).is_none());
        let conn_id = ed.select_shape(circle).unwrap();
        assert!(!ed.router().is_active());

        assert_eq!(ed.document().connections().len(), 1);
        let conn = ed.document().connection(conn_id).unwrap();
        assert_eq!((conn.from, conn.to), (rect, circle));
        assert_eq!(conn.line_style, LineStyle::Solid);
        assert_eq!(conn.arrow_style, ArrowStyle::End);

        let json = serde_json::to_value(conn).unwrap();
        assert_eq!(json["lineStyle"], "solid");
        assert_eq!(json["arrowStyle"], "end");

        let path = geometry::connector_path(conn, ed.document().shapes()).unwrap();
        assert!((path.start.x - 228.0).abs() < 1e-9);
        assert!((path.start.y - 164.0).abs() < 1e-9);
        assert!((path.end.x - 400.0).abs() < 1e-9);
        assert!((path.end.y - 164.0).abs() < 1e-9);
        assert_eq!(path.curve, geometry::ConnectorCurve::Straight);

        assert_eq!(ed.history().kinds().last(), Some(ActionKind::AddConnection));
    }

    #[test]
    fn test_connect_same_shape_twice_is_noop() {
        let mut ed = editor();
        let a = ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        ed.toggle_connect_mode();
        ed.select_shape(a);
        assert!(ed.select_shape(a).is_none());
        assert!(ed.document().connections().is_empty());
        ed.click_canvas();
        assert!(!ed.router().is_active());
    }

    #[test]
    fn test_cascade_delete_and_undo() {
        let mut ed = editor();
        let a = ed.add_shape(ShapeKind::Rectangle, Some(Point::new(0.0, 0.0)));
        let b = ed.add_shape(ShapeKind::Circle, Some(Point::new(300.0, 0.0)));
        let c = ed.add_shape(ShapeKind::Diamond, Some(Point::new(0.0, 300.0)));
        let ab = ed.connect(a, b).unwrap();
        let bc = ed.connect(b, c).unwrap();
        let ca = ed.connect(c, a).unwrap();
        ed.set_connection_style(bc, LineStyle::Dashed, ArrowStyle::Both);
        let before = ed.document().clone();

        ed.select_shape(b);
        assert!(ed.delete_selected());
        assert!(ed.document().shape(b).is_none());
        let remaining: Vec<_> = ed.document().connections().iter().map(|c| c.id).collect();
        assert_eq!(remaining, vec![ca]);
        assert_eq!(ed.selection(), Selection::None);
        assert_eq!(ed.history().kinds().last(), Some(ActionKind::DeleteShape));

        assert_eq!(ed.undo(), Some(ActionKind::DeleteShape));
        assert_eq!(ed.document(), &before);
        let restored = ed.document().connection(bc).unwrap();
        assert_eq!(restored.line_style, LineStyle::Dashed);
        assert!(ed.document().connection(ab).is_some());
    }

    #[test]
    fn test_delete_connection() {
        let mut ed = editor();
        let a = ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        let b = ed.add_shape(ShapeKind::Square, Some(Point::new(400.0, 0.0)));
        let conn = ed.connect(a, b).unwrap();
        assert!(ed.select_connection(conn));
        assert!(ed.delete_selected());
        assert!(ed.document().connections().is_empty());
        ed.undo();
        assert!(ed.document().connection(conn).is_some());
    }

    #[test]
    fn test_drag_is_one_history_entry() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Square, Some(Point::new(10.0, 10.0)));
        let entries = ed.history().len();

        assert!(ed.begin_drag(id, Point::new(20.0, 20.0)));
        for step in 1..=10 {
            ed.update_gesture(Point::new(20.0 + step as f64 * 5.0, 20.0));
        }
        assert_eq!(ed.history().len(), entries);
        assert_eq!(ed.document().shape(id).unwrap().position, Point::new(60.0, 10.0));

        assert_eq!(ed.commit_gesture(), Some(ActionKind::MoveShape));
        assert_eq!(ed.history().len(), entries + 1);

        ed.undo();
        assert_eq!(ed.document().shape(id).unwrap().position, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_gesture_without_movement_records_nothing() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        ed.begin_drag(id, Point::new(5.0, 5.0));
        ed.update_gesture(Point::new(5.0, 5.0));
        assert!(ed.commit_gesture().is_none());
        assert_eq!(ed.history().len(), 1);
    }

    #[test]
    fn test_cancel_gesture_restores_shape() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        ed.begin_drag(id, Point::ZERO);
        ed.update_gesture(Point::new(100.0, 100.0));
        ed.cancel_gesture();
        assert_eq!(ed.document().shape(id).unwrap().position, Point::ZERO);
        assert_eq!(ed.history().len(), 1);
    }

    #[test]
    fn test_line_end_drag_moves_end() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Line, Some(Point::ZERO));
        assert!(ed.begin_line_end_drag(id, Point::new(128.0, 0.0)));
        ed.update_gesture(Point::new(150.0, 60.0));
        assert_eq!(ed.commit_gesture(), Some(ActionKind::MoveShape));
        let line = ed.document().shape(id).unwrap();
        assert_eq!(line.position, Point::ZERO);
        assert_eq!(line.end, Some(Point::new(150.0, 60.0)));
        assert!(!ed.begin_resize(id, Corner::BottomRight, Point::ZERO));

        let square = ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        assert!(!ed.begin_line_end_drag(square, Point::ZERO));
    }

    #[test]
    fn test_line_moves_as_a_whole() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Line, Some(Point::ZERO));

        ed.begin_drag(id, Point::new(64.0, 0.0));
        ed.update_gesture(Point::new(84.0, 50.0));
        ed.commit_gesture();
        let line = ed.document().shape(id).unwrap();
        assert_eq!(line.position, Point::new(20.0, 50.0));
        assert_eq!(line.end, Some(Point::new(148.0, 50.0)));

        assert!(ed.move_shape(id, Point::new(0.0, 100.0)));
        let line = ed.document().shape(id).unwrap();
        assert_eq!(line.end, Some(Point::new(128.0, 100.0)));

        ed.undo();
        ed.undo();
        let line = ed.document().shape(id).unwrap();
        assert_eq!(line.position, Point::ZERO);
        assert_eq!(line.end, Some(Point::new(128.0, 0.0)));
    }

    #[test]
    fn test_circle_resize_scenario() {
        let mut ed = editor();
        let id = ed.place_shape(Shape::new(ShapeKind::Circle, Point::ZERO).with_size(100.0, 100.0));

        assert!(ed.begin_resize(id, Corner::BottomRight, Point::new(100.0, 100.0)));
        ed.update_gesture(Point::new(40.0, 70.0));
        assert_eq!(ed.commit_gesture(), Some(ActionKind::ResizeShape));

        let shape = ed.document().shape(id).unwrap();
        assert_eq!((shape.width, shape.height), (Some(70.0), Some(70.0)));
    }

    #[test]
    fn test_resize_minimum() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Rectangle, Some(Point::ZERO));
        assert!(ed.resize_shape(id, 10.0, 200.0));
        let shape = ed.document().shape(id).unwrap();
        assert_eq!((shape.width, shape.height), (Some(50.0), Some(200.0)));
        assert!(!ed.resize_shape(id, 10.0, 200.0));
    }

    #[test]
    fn test_text_edit_commit_and_blur() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Rectangle, Some(Point::ZERO));
        assert!(ed.begin_text_edit(id));
        for c in "Go".chars() {
            ed.text_key(TextKey::Character(c.to_string()), TextModifiers::default());
        }
        ed.text_key(TextKey::Enter, TextModifiers::shift());
        ed.text_key(TextKey::Character("!".into()), TextModifiers::default());
        assert_eq!(ed.document().shape(id).unwrap().text, "");

        assert_eq!(
            ed.text_key(TextKey::Enter, TextModifiers::default()),
            TextEditResult::Commit
        );
        assert_eq!(ed.document().shape(id).unwrap().text, "Go\n!");
        assert_eq!(ed.history().kinds().last(), Some(ActionKind::UpdateText));
        assert!(ed.text_edit().is_none());

        let note = ed.add_shape(ShapeKind::Text, Some(Point::new(300.0, 0.0)));
        ed.begin_text_edit(note);
        ed.text_key(TextKey::Character("x".into()), TextModifiers::default());
        ed.text_key(TextKey::Enter, TextModifiers::default());
        assert!(ed.text_edit().is_some());
        ed.click_canvas();
        assert_eq!(ed.document().shape(note).unwrap().text, "x\n");
    }

    #[test]
    fn test_unchanged_text_records_nothing() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Circle, Some(Point::ZERO));
        ed.begin_text_edit(id);
        assert!(!ed.commit_text_edit());
        assert_eq!(ed.history().len(), 1);
    }

    #[test]
    fn test_clear_screen_restores_identity() {
        let mut ed = editor();
        let store = MemoryStore::new();
        ed.add_shape(ShapeKind::Diamond, Some(Point::ZERO));
        let receipt = block_on(ed.save(&store)).unwrap();
        let before = ed.document().clone();

        assert!(ed.clear_screen());
        assert!(ed.document().is_empty());
        assert!(ed.identity().id.is_none());

        assert_eq!(ed.undo(), Some(ActionKind::ClearScreen));
        assert_eq!(ed.document(), &before);
        assert_eq!(ed.identity().id.as_deref(), Some(receipt.id.as_str()));
        assert!(!editor().clear_screen());
    }

    fn draw_stroke(ed: &mut Editor, at: Point) {
        ed.set_drawing_tool(DrawingTool::Draw);
        ed.drawing_pointer_down(at);
        ed.drawing_pointer_move(at + kurbo::Vec2::new(10.0, 0.0));
        ed.drawing_pointer_move(at + kurbo::Vec2::new(20.0, 5.0));
        ed.drawing_pointer_up();
        ed.set_drawing_tool(DrawingTool::Off);
    }

    #[test]
    fn test_strokes_survive_clear_undo_redo() {
        let mut ed = editor();
        ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        assert!(ed.clear_screen());
        draw_stroke(&mut ed, Point::new(500.0, 500.0));
        let stroke = ed.document().drawings()[0].id;

        assert_eq!(ed.undo(), Some(ActionKind::ClearScreen));
        assert_eq!(ed.document().shapes().len(), 1);
        assert_eq!(ed.document().drawings().len(), 1);
        assert_eq!(ed.redo(), Some(ActionKind::ClearScreen));
        assert!(ed.document().shapes().is_empty());
        assert_eq!(ed.document().drawings().len(), 1);
        assert!(ed.document().drawing(stroke).is_some());
    }

    #[test]
    fn test_clear_removes_and_restores_its_own_strokes() {
        let mut ed = editor();
        draw_stroke(&mut ed, Point::new(10.0, 10.0));
        let old = ed.document().drawings()[0].id;
        assert!(ed.clear_screen());
        assert!(ed.document().drawings().is_empty());
        draw_stroke(&mut ed, Point::new(500.0, 500.0));
        let later = ed.document().drawings()[0].id;

        ed.undo();
        let ids: Vec<_> = ed.document().drawings().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![old, later]);
        ed.redo();
        let ids: Vec<_> = ed.document().drawings().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![later]);
    }

    #[test]
    fn test_clear_keeps_background() {
        let mut ed = editor();
        assert!(ed.set_background_color("#eeeeee"));
        assert!(!ed.clear_screen());
        ed.add_shape(ShapeKind::Circle, Some(Point::ZERO));
        assert!(ed.clear_screen());
        assert_eq!(ed.document().background_color(), "#eeeeee");
        assert_eq!(ed.undo(), Some(ActionKind::ClearScreen));
        assert_eq!(ed.document().shapes().len(), 1);
        assert_eq!(ed.document().background_color(), "#eeeeee");
    }

    #[test]
    fn test_strokes_survive_suggestion_undo_redo() {
        let mut ed = editor();
        ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        let suggested = DiagramState {
            shapes: vec![Shape::new(ShapeKind::Circle, Point::new(200.0, 0.0))],
            ..DiagramState::default()
        };
        assert!(ed.apply_suggestion(Suggestion {
            state: suggested,
            mode: SuggestionMode::Replace,
        }));
        draw_stroke(&mut ed, Point::new(500.0, 500.0));
        let stroke = ed.document().drawings()[0].id;

        assert_eq!(ed.undo(), Some(ActionKind::ApplySuggestion));
        assert_eq!(ed.document().shapes()[0].kind, ShapeKind::Square);
        assert_eq!(ed.document().drawings().len(), 1);
        assert_eq!(ed.redo(), Some(ActionKind::ApplySuggestion));
        assert_eq!(ed.document().shapes()[0].kind, ShapeKind::Circle);
        assert_eq!(ed.document().drawings().len(), 1);
        assert!(ed.document().drawing(stroke).is_some());
    }

    #[test]
    fn test_merged_strokes_undo_alone() {
        let mut ed = editor();
        draw_stroke(&mut ed, Point::new(10.0, 10.0));
        let mine = ed.document().drawings()[0].clone();
        let suggested = DiagramState {
            drawings: vec![mine.clone()],
            ..DiagramState::default()
        };
        assert!(ed.apply_suggestion(Suggestion {
            state: suggested,
            mode: SuggestionMode::Merge,
        }));
        assert_eq!(ed.document().drawings().len(), 2);
        assert_ne!(ed.document().drawings()[1].id, mine.id);

        ed.undo();
        assert_eq!(ed.document().drawings(), std::slice::from_ref(&mine));
    }

    #[test]
    fn test_draw_erase_scenario() {
        let mut ed = editor();
        ed.set_drawing_tool(DrawingTool::Draw);
        ed.drawing_pointer_down(Point::new(10.0, 10.0));
        ed.drawing_pointer_move(Point::new(20.0, 10.0));
        ed.drawing_pointer_move(Point::new(30.0, 10.0));
        ed.drawing_pointer_up();
        assert_eq!(ed.document().drawings().len(), 1);

        ed.set_drawing_tool(DrawingTool::Erase);
        ed.drawing_pointer_down(Point::new(20.0, 10.0));
        ed.drawing_pointer_up();
        assert!(ed.document().drawings().is_empty());
        let entries = ed.drawing().history().len();

        let snapshot = ed.document().clone();
        ed.drawing_pointer_down(Point::new(1000.0, 1000.0));
        ed.drawing_pointer_up();
        assert_eq!(ed.document(), &snapshot);
        assert_eq!(ed.drawing().history().len(), entries);
        assert!(ed.history().is_empty());
    }

    #[test]
    fn test_undo_logs_are_independent() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        ed.set_drawing_tool(DrawingTool::Draw);
        ed.drawing_pointer_down(Point::new(500.0, 500.0));
        ed.drawing_pointer_up();

        ed.undo();
        assert!(ed.document().shape(id).is_none());
        assert_eq!(ed.document().drawings().len(), 1);

        ed.redo();
        assert!(ed.drawing_undo());
        assert!(ed.document().shape(id).is_some());
        assert!(ed.document().drawings().is_empty());
    }

    #[test]
    fn test_shortcuts_scope_to_drawing_tool() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        ed.set_drawing_tool(DrawingTool::Draw);
        ed.drawing_pointer_down(Point::new(500.0, 500.0));
        ed.drawing_pointer_up();

        assert_eq!(
            ed.handle_shortcut("z", Modifiers::ctrl()),
            Some(KeyCommand::DrawingUndo)
        );
        assert!(ed.document().drawings().is_empty());
        assert!(ed.document().shape(id).is_some());

        ed.set_drawing_tool(DrawingTool::Off);
        assert_eq!(ed.handle_shortcut("z", Modifiers::ctrl()), Some(KeyCommand::Undo));
        assert!(ed.document().shape(id).is_none());
        assert_eq!(ed.handle_shortcut("y", Modifiers::ctrl()), Some(KeyCommand::Redo));
        assert!(ed.document().shape(id).is_some());
    }

    #[test]
    fn test_delete_key_ignored_while_editing_text() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        ed.begin_text_edit(id);
        assert!(ed.handle_shortcut("Delete", Modifiers::default()).is_none());
        assert!(ed.document().shape(id).is_some());
    }

    #[test]
    fn test_file_round_trip() {
        let mut ed = editor();
        let a = ed.add_shape(ShapeKind::Rectangle, Some(Point::new(10.0, 10.0)));
        let b = ed.add_shape(ShapeKind::Circle, Some(Point::new(300.0, 10.0)));
        let c = ed.connect(a, b).unwrap();
        ed.set_connection_style(c, LineStyle::Dotted, ArrowStyle::Start);
        ed.set_drawing_tool(DrawingTool::Draw);
        ed.drawing_pointer_down(Point::new(1.0, 1.0));
        ed.drawing_pointer_up();
        let json = ed.export_json().unwrap();

        let mut other = editor();
        other.import_json(&json).unwrap();
        assert_eq!(other.document().state(), ed.document().state());
        assert!(other.history().is_empty());
        assert!(!other.drawing().history().can_undo());
    }

    #[test]
    fn test_import_missing_drawings_key() {
        let mut ed = editor();
        ed.import_json(r##"{"shapes": [], "connections": [], "backgroundColor": "#000000"}"##)
            .unwrap();
        assert!(ed.document().drawings().is_empty());
        assert_eq!(ed.document().background_color(), "#000000");
    }

    #[test]
    fn test_invalid_import_leaves_diagram() {
        let mut ed = editor();
        ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        let before = ed.document().clone();
        assert!(ed.import_json("{ nope").is_err());
        assert!(ed.import_json("[1, 2]").is_err());
        assert_eq!(ed.document(), &before);
        assert_eq!(ed.history().len(), 1);
        let notices = ed.take_notices();
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Error));
    }

    #[test]
    fn test_save_load_and_share() {
        let store = MemoryStore::new();
        let mut ed = Editor::with_session(EditorConfig::default(), Box::new(UserSession::new("alice")));
        ed.add_shape(ShapeKind::Diamond, Some(Point::new(5.0, 5.0)));
        let receipt = block_on(ed.save(&store)).unwrap();
        assert_eq!(ed.identity().share_id.as_deref(), Some(receipt.share_id.as_str()));

        let link = ed.share_link(ShareMode::View).unwrap();
        let mut viewer = editor();
        assert!(!block_on(viewer.open_share_link(&store, &link.to_string())));
        assert_eq!(viewer.take_notices()[0].message, "This diagram is private");

        assert!(block_on(ed.set_visibility(&store, true)));
        assert!(ed.identity().is_public);
        assert!(block_on(viewer.open_share_link(&store, &link.to_string())));
        assert_eq!(viewer.document().state(), ed.document().state());

        let mut reloaded = editor();
        assert!(block_on(reloaded.load(&store, &receipt.id)));
        assert_eq!(reloaded.identity().id.as_deref(), Some(receipt.id.as_str()));
    }

    #[test]
    fn test_failed_load_keeps_model() {
        let store = MemoryStore::new();
        let mut ed = editor();
        ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        let before = ed.document().clone();
        assert!(!block_on(ed.load(&store, "missing")));
        assert_eq!(ed.document(), &before);
        assert_eq!(ed.take_notices(), vec![Notice::error("Diagram not found")]);
        assert!(!block_on(ed.load(&store, "missing")));
    }

    #[test]
    fn test_visibility_requires_saved_diagram() {
        let store = MemoryStore::new();
        let mut ed = editor();
        assert!(!block_on(ed.set_visibility(&store, true)));
        assert_eq!(ed.take_notices().len(), 1);
    }

    #[test]
    fn test_one_save_in_flight() {
        let mut ed = editor();
        let first = ed.prepare_save().unwrap();
        assert!(ed.prepare_save().is_none());
        let receipt = SaveReceipt {
            id: "d1".into(),
            share_id: "s1".into(),
        };
        assert!(ed.complete_save(first.ticket, Ok(receipt)).is_some());
        assert!(ed.prepare_save().is_some());
    }

    #[test]
    fn test_response_after_unmount_is_discarded() {
        let mut ed = editor();
        let ticket = ed.begin_request(RequestKind::Load).unwrap();
        ed.unmount();
        let stored = StoredDiagram::new("x".into(), None, DiagramState::default());
        assert!(!ed.complete_load(ticket, Ok(stored)));
        assert!(ed.identity().id.is_none());
        assert!(ed.take_notices().is_empty());
    }

    #[test]
    fn test_apply_suggestion_replace_and_merge() {
        let mut ed = editor();
        let existing = ed.add_shape(ShapeKind::Square, Some(Point::ZERO));

        let a = Shape::new(ShapeKind::Rectangle, Point::new(10.0, 200.0));
        let b = Shape::new(ShapeKind::Circle, Point::new(300.0, 200.0));
        let conn = Connection::new(a.id, b.id);
        let suggested = DiagramState {
            shapes: vec![a.clone(), b],
            connections: vec![conn],
            ..DiagramState::default()
        };

        assert!(ed.apply_suggestion(Suggestion {
            state: suggested.clone(),
            mode: SuggestionMode::Merge,
        }));
        assert_eq!(ed.document().shapes().len(), 3);
        assert!(ed.document().shape(existing).is_some());
        assert!(ed.document().shape(a.id).is_none());
        let merged = &ed.document().connections()[0];
        assert!(ed.document().shape(merged.from).is_some());
        assert!(ed.document().shape(merged.to).is_some());

        assert!(ed.apply_suggestion(Suggestion {
            state: suggested.clone(),
            mode: SuggestionMode::Replace,
        }));
        assert_eq!(ed.document().state(), &suggested);
        assert_eq!(ed.undo(), Some(ActionKind::ApplySuggestion));
        assert_eq!(ed.document().shapes().len(), 3);
    }

    #[test]
    fn test_undo_drops_stale_selection() {
        let mut ed = editor();
        let id = ed.add_shape(ShapeKind::Circle, Some(Point::ZERO));
        assert_eq!(ed.selection(), Selection::Shape(id));
        ed.undo();
        assert_eq!(ed.selection(), Selection::None);
    }

    #[test]
    fn test_click_at_hits_topmost() {
        let mut ed = editor();
        let under = ed.add_shape(ShapeKind::Square, Some(Point::ZERO));
        let over = ed.add_shape(ShapeKind::Square, Some(Point::new(50.0, 50.0)));
        assert_eq!(ed.click_at(Point::new(60.0, 60.0)), Selection::Shape(over));
        ed.send_to_back(over);
        assert_eq!(ed.click_at(Point::new(60.0, 60.0)), Selection::Shape(under));
        assert_eq!(ed.click_at(Point::new(900.0, 900.0)), Selection::None);
    }

    #[test]
    fn test_export_bounds_uses_config() {
        let mut ed = editor();
        assert!(ed.export_bounds().is_none());
        ed.add_shape(ShapeKind::Square, Some(Point::new(100.0, 100.0)));
        let bounds = ed.export_bounds().unwrap();
        assert!((bounds.x0 - 50.0).abs() < f64::EPSILON);
        assert!((bounds.width() - 228.0).abs() < f64::EPSILON);
    }
}
