//! Freehand drawing and erasing.
//!
//! Strokes are captured as raw pointer samples with no smoothing. Every
//! finished stroke and every erase tick that removes something is one entry
//! in the drawing history.

use crate::config::EditorConfig;
use crate::document::DiagramDocument;
use crate::history::DrawingHistory;
use crate::shapes::{DrawingId, DrawingPath, PathPoint, PointKind};
use kurbo::Point;

/// Which freehand tool owns the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawingTool {
    #[default]
    Off,
    Draw,
    Erase,
}

/// Stroke capture state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StrokeState {
    #[default]
    Inactive,
    Active(Vec<PathPoint>),
}

/// What a pointer event did.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingOutcome {
    /// The event was not for the drawing tools.
    Ignored,
    /// A stroke is in progress.
    Sampled,
    /// A stroke was committed.
    StrokeFinished(DrawingId),
    /// Strokes were removed by the eraser.
    Erased(Vec<DrawingId>),
}

/// Freehand capture, eraser hit-testing and the drawing undo log.
#[derive(Debug, Clone)]
pub struct DrawingEngine {
    tool: DrawingTool,
    stroke: StrokeState,
    /// Pointer is held down with the eraser.
    erasing: bool,
    color: String,
    width: f64,
    eraser_tolerance: f64,
    history: DrawingHistory,
}

impl Default for DrawingEngine {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl DrawingEngine {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            tool: DrawingTool::Off,
            stroke: StrokeState::Inactive,
            erasing: false,
            color: config.stroke_color.clone(),
            width: config.stroke_width,
            eraser_tolerance: config.eraser_tolerance,
            history: DrawingHistory::new(),
        }
    }

    pub fn tool(&self) -> DrawingTool {
        self.tool
    }

    /// Switch tools. Any stroke in progress is discarded.
    pub fn set_tool(&mut self, tool: DrawingTool) {
        self.tool = tool;
        self.stroke = StrokeState::Inactive;
        self.erasing = false;
    }

    /// Override the style applied to new strokes.
    pub fn set_stroke_style(&mut self, color: impl Into<String>, width: f64) {
        self.color = color.into();
        self.width = width;
    }

    /// Points of the stroke being drawn, for live preview.
    pub fn current_stroke(&self) -> Option<&[PathPoint]> {
        match &self.stroke {
            StrokeState::Active(points) => Some(points),
            StrokeState::Inactive => None,
        }
    }

    pub fn history(&self) -> &DrawingHistory {
        &self.history
    }

    /// Restart the drawing log from the document's current strokes.
    pub fn reset_history(&mut self, doc: &DiagramDocument) {
        self.history.reset(doc.drawings().to_vec());
    }

    pub fn pointer_down(&mut self, doc: &mut DiagramDocument, point: Point) -> DrawingOutcome {
        match self.tool {
            DrawingTool::Off => DrawingOutcome::Ignored,
            DrawingTool::Draw => {
                self.stroke = StrokeState::Active(vec![PathPoint::new(point, PointKind::Start)]);
                DrawingOutcome::Sampled
            }
            DrawingTool::Erase => {
                self.erasing = true;
                DrawingOutcome::Erased(self.erase_at(doc, point))
            }
        }
    }

    pub fn pointer_move(&mut self, doc: &mut DiagramDocument, point: Point) -> DrawingOutcome {
        match self.tool {
            DrawingTool::Draw => match &mut self.stroke {
                StrokeState::Active(points) => {
                    points.push(PathPoint::new(point, PointKind::Point));
                    DrawingOutcome::Sampled
                }
                StrokeState::Inactive => DrawingOutcome::Ignored,
            },
            DrawingTool::Erase if self.erasing => DrawingOutcome::Erased(self.erase_at(doc, point)),
            _ => DrawingOutcome::Ignored,
        }
    }

    /// Finish the gesture. A drawn stroke is committed to the document.
    pub fn pointer_up(&mut self, doc: &mut DiagramDocument) -> DrawingOutcome {
        self.erasing = false;
        let StrokeState::Active(mut points) = std::mem::take(&mut self.stroke) else {
            return DrawingOutcome::Ignored;
        };
        let Some(last) = points.last().copied() else {
            return DrawingOutcome::Ignored;
        };
        points.push(PathPoint::new(last.position(), PointKind::End));

        let mut path = DrawingPath::new(points);
        path.color = self.color.clone();
        path.width = self.width;
        let id = path.id;
        if !doc.add_drawing(path) {
            return DrawingOutcome::Ignored;
        }
        self.history.record(doc.drawings().to_vec());
        log::debug!("drawing: stroke {id} committed");
        DrawingOutcome::StrokeFinished(id)
    }

    /// Remove every stroke with a sample near `point`, as one history entry.
    ///
    /// Nothing is recorded when no stroke is hit.
    pub fn erase_at(&mut self, doc: &mut DiagramDocument, point: Point) -> Vec<DrawingId> {
        let hits: Vec<DrawingId> = doc
            .drawings()
            .iter()
            .filter(|path| path.is_near(point, self.eraser_tolerance))
            .map(|path| path.id)
            .collect();
        if hits.is_empty() {
            return hits;
        }
        doc.remove_drawings(&hits);
        self.history.record(doc.drawings().to_vec());
        log::debug!("drawing: erased {} stroke(s)", hits.len());
        hits
    }

    /// Step the drawing log back. Returns false when there is nothing to undo.
    pub fn undo(&mut self, doc: &mut DiagramDocument) -> bool {
        match self.history.undo() {
            Some(drawings) => {
                doc.set_drawings(drawings.to_vec());
                true
            }
            None => false,
        }
    }

    /// Step the drawing log forward. Returns false when there is nothing to redo.
    pub fn redo(&mut self, doc: &mut DiagramDocument) -> bool {
        match self.history.redo() {
            Some(drawings) => {
                doc.set_drawings(drawings.to_vec());
                true
            }
            None => false,
        }
    }
}
