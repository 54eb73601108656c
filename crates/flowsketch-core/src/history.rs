//! Undo/redo logs.
//!
//! [`History`] is a linear log of reversible commands over the document.
//! [`DrawingHistory`] is a separate snapshot log for freehand strokes, so
//! undoing a shape edit never touches drawing undo state and vice versa.

use crate::document::DiagramDocument;
use crate::shapes::DrawingPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag describing what a history action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    AddShape,
    DeleteShape,
    MoveShape,
    ResizeShape,
    UpdateText,
    UpdateColor,
    UpdateBorderColor,
    UpdateBorderWidth,
    ReorderShape,
    AddConnection,
    DeleteConnection,
    UpdateConnectionStyle,
    UpdateBackground,
    ClearScreen,
    ApplySuggestion,
}

type Apply = Box<dyn Fn(&mut DiagramDocument)>;

/// A reversible command.
///
/// `undo` followed by `redo` must reproduce the state exactly.
pub struct HistoryAction {
    kind: ActionKind,
    payload: serde_json::Value,
    undo: Apply,
    redo: Apply,
}

impl HistoryAction {
    pub fn new(
        kind: ActionKind,
        payload: serde_json::Value,
        undo: impl Fn(&mut DiagramDocument) + 'static,
        redo: impl Fn(&mut DiagramDocument) + 'static,
    ) -> Self {
        Self {
            kind,
            payload,
            undo: Box::new(undo),
            redo: Box::new(redo),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Descriptive data recorded with the action.
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

impl fmt::Debug for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryAction")
            .field("kind", &self.kind)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

/// Linear undo/redo log with a cursor on the last applied action.
#[derive(Debug, Default)]
pub struct History {
    actions: Vec<HistoryAction>,
    /// Number of applied actions; the cursor is `applied - 1`.
    applied: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-applied action, discarding anything redoable.
    pub fn record(&mut self, action: HistoryAction) {
        log::debug!("history: record {:?}", action.kind);
        self.actions.truncate(self.applied);
        self.actions.push(action);
        self.applied = self.actions.len();
    }

    /// Undo the action at the cursor. Returns its kind, or `None` if empty.
    pub fn undo(&mut self, doc: &mut DiagramDocument) -> Option<ActionKind> {
        if self.applied == 0 {
            return None;
        }
        self.applied -= 1;
        let action = &self.actions[self.applied];
        (action.undo)(doc);
        log::debug!("history: undo {:?}", action.kind);
        Some(action.kind)
    }

    /// Reapply the action after the cursor. Returns its kind, or `None` at the end.
    pub fn redo(&mut self, doc: &mut DiagramDocument) -> Option<ActionKind> {
        let action = self.actions.get(self.applied)?;
        (action.redo)(doc);
        self.applied += 1;
        log::debug!("history: redo {:?}", action.kind);
        Some(action.kind)
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.actions.len()
    }

    /// Index of the last applied action, `None` when nothing is applied.
    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Kinds of all logged actions, oldest first.
    pub fn kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.actions.iter().map(|a| a.kind)
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.applied = 0;
    }
}

/// Snapshot log for freehand strokes.
///
/// Each entry is the full drawing list after an action. `baseline` is the
/// list before the first entry.
#[derive(Debug, Clone, Default)]
pub struct DrawingHistory {
    baseline: Vec<DrawingPath>,
    entries: Vec<Vec<DrawingPath>>,
    applied: usize,
}

impl DrawingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries and start over from `baseline`.
    pub fn reset(&mut self, baseline: Vec<DrawingPath>) {
        self.baseline = baseline;
        self.entries.clear();
        self.applied = 0;
    }

    /// Record the drawing list resulting from an action.
    pub fn record(&mut self, snapshot: Vec<DrawingPath>) {
        self.entries.truncate(self.applied);
        self.entries.push(snapshot);
        self.applied = self.entries.len();
    }

    /// Step back. Returns the drawing list to restore.
    pub fn undo(&mut self) -> Option<&[DrawingPath]> {
        if self.applied == 0 {
            return None;
        }
        self.applied -= 1;
        Some(self.current())
    }

    /// Step forward. Returns the drawing list to restore.
    pub fn redo(&mut self) -> Option<&[DrawingPath]> {
        if self.applied >= self.entries.len() {
            return None;
        }
        self.applied += 1;
        Some(self.current())
    }

    fn current(&self) -> &[DrawingPath] {
        match self.applied {
            0 => &self.baseline,
            n => &self.entries[n - 1],
        }
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
