//! Inline label editing.

use crate::shapes::{Shape, ShapeId, ShapeKind};

/// Keyboard key for text editing.
#[derive(Debug, Clone, PartialEq)]
pub enum TextKey {
    Character(String),
    Backspace,
    Delete,
    Enter,
    Left,
    Right,
    Home,
    End,
    Escape,
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl TextModifiers {
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }
}

/// Result of handling a text editing event.
#[derive(Debug, Clone, PartialEq)]
pub enum TextEditResult {
    /// Event was handled, the buffer may have changed.
    Handled,
    /// The user finished editing; the buffer should be committed.
    Commit,
    /// The user abandoned the edit; the original text stays.
    Cancel,
    /// Event was not handled (pass to other handlers).
    NotHandled,
}

/// Edit buffer for the label of one shape.
#[derive(Debug, Clone)]
pub struct TextEditState {
    shape_id: ShapeId,
    kind: ShapeKind,
    buffer: String,
    /// Byte offset of the caret, always on a char boundary.
    cursor: usize,
    /// Label when editing started.
    original: String,
}

impl TextEditState {
    /// Start editing `shape`'s label with the caret at the end.
    pub fn new(shape: &Shape) -> Self {
        Self {
            shape_id: shape.id,
            kind: shape.kind,
            buffer: shape.text.clone(),
            cursor: shape.text.len(),
            original: shape.text.clone(),
        }
    }

    pub fn shape_id(&self) -> ShapeId {
        self.shape_id
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_changed(&self) -> bool {
        self.buffer != self.original
    }

    /// Handle a key press.
    ///
    /// Enter commits for boxed shapes unless Shift is held; text shapes
    /// always take Enter as a newline.
    pub fn handle_key(&mut self, key: TextKey, modifiers: TextModifiers) -> TextEditResult {
        match key {
            TextKey::Escape => return TextEditResult::Cancel,
            TextKey::Enter => {
                if self.kind != ShapeKind::Text && !modifiers.shift {
                    return TextEditResult::Commit;
                }
                self.insert("\n");
            }
            TextKey::Character(s) => {
                if modifiers.ctrl || modifiers.meta {
                    return TextEditResult::NotHandled;
                }
                self.insert(&s);
            }
            TextKey::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.buffer.replace_range(prev..self.cursor, "");
                    self.cursor = prev;
                }
            }
            TextKey::Delete => {
                if let Some(next) = self.next_boundary() {
                    self.buffer.replace_range(self.cursor..next, "");
                }
            }
            TextKey::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor = prev;
                }
            }
            TextKey::Right => {
                if let Some(next) = self.next_boundary() {
                    self.cursor = next;
                }
            }
            TextKey::Home => self.cursor = 0,
            TextKey::End => self.cursor = self.buffer.len(),
        }
        TextEditResult::Handled
    }

    fn insert(&mut self, s: &str) {
        self.buffer.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn type_str(state: &mut TextEditState, s: &str) {
        for c in s.chars() {
            state.handle_key(TextKey::Character(c.to_string()), TextModifiers::default());
        }
    }

    #[test]
    fn test_enter_commits_boxed_shape() {
        let shape = Shape::new(ShapeKind::Rectangle, Point::ZERO).with_text("Start");
        let mut state = TextEditState::new(&shape);
        type_str(&mut state, "!");
        assert_eq!(
            state.handle_key(TextKey::Enter, TextModifiers::default()),
            TextEditResult::Commit
        );
        assert_eq!(state.text(), "Start!");
        assert!(state.is_changed());
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let shape = Shape::new(ShapeKind::Diamond, Point::ZERO).with_text("a");
        let mut state = TextEditState::new(&shape);
        assert_eq!(
            state.handle_key(TextKey::Enter, TextModifiers::shift()),
            TextEditResult::Handled
        );
        type_str(&mut state, "b");
        assert_eq!(state.text(), "a\nb");
    }

    #[test]
    fn test_text_shape_enter_is_newline() {
        let shape = Shape::new(ShapeKind::Text, Point::ZERO);
        let mut state = TextEditState::new(&shape);
        type_str(&mut state, "x");
        assert_eq!(
            state.handle_key(TextKey::Enter, TextModifiers::default()),
            TextEditResult::Handled
        );
        assert_eq!(state.text(), "x\n");
    }

    #[test]
    fn test_caret_editing_handles_multibyte() {
        let shape = Shape::new(ShapeKind::Circle, Point::ZERO).with_text("née");
        let mut state = TextEditState::new(&shape);
        state.handle_key(TextKey::Left, TextModifiers::default());
        state.handle_key(TextKey::Backspace, TextModifiers::default());
        assert_eq!(state.text(), "ne");
        state.handle_key(TextKey::Home, TextModifiers::default());
        state.handle_key(TextKey::Delete, TextModifiers::default());
        assert_eq!(state.text(), "e");
        state.handle_key(TextKey::End, TextModifiers::default());
        state.handle_key(TextKey::Right, TextModifiers::default());
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    fn test_escape_cancels() {
        let shape = Shape::new(ShapeKind::Square, Point::ZERO).with_text("keep");
        let mut state = TextEditState::new(&shape);
        type_str(&mut state, "zzz");
        assert_eq!(
            state.handle_key(TextKey::Escape, TextModifiers::default()),
            TextEditResult::Cancel
        );
        assert_eq!(state.original(), "keep");
    }
}
