//! Keyboard shortcut registry and resolution.

use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::default()
        }
    }

    /// Ctrl or Cmd.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Editor command bound to a key chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCommand {
    Undo,
    Redo,
    DrawingUndo,
    DrawingRedo,
    DeleteSelection,
    Cancel,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, "Undo (drawing undo while drawing or erasing)"),
            Shortcut::new("Z", true, true, "Redo (drawing redo while drawing or erasing)"),
            Shortcut::new("Y", true, false, "Redo"),
            Shortcut::new("Delete", false, false, "Delete selection"),
            Shortcut::new("Backspace", false, false, "Delete selection"),
            Shortcut::new("Escape", false, false, "Cancel current action"),
        ]
    }

    /// Map a key press to a command.
    ///
    /// While a freehand tool is active the undo chords drive the drawing log.
    pub fn resolve(key: &str, modifiers: Modifiers, drawing_active: bool) -> Option<KeyCommand> {
        let key = key.to_ascii_lowercase();
        if modifiers.command() {
            return match (key.as_str(), modifiers.shift) {
                ("z", false) if drawing_active => Some(KeyCommand::DrawingUndo),
                ("z", true) if drawing_active => Some(KeyCommand::DrawingRedo),
                ("z", false) => Some(KeyCommand::Undo),
                ("z", true) | ("y", false) => Some(KeyCommand::Redo),
                _ => None,
            };
        }
        match key.as_str() {
            "delete" | "backspace" => Some(KeyCommand::DeleteSelection),
            "escape" => Some(KeyCommand::Cancel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_chords() {
        assert_eq!(
            ShortcutRegistry::resolve("z", Modifiers::ctrl(), false),
            Some(KeyCommand::Undo)
        );
        assert_eq!(
            ShortcutRegistry::resolve("Z", Modifiers::ctrl_shift(), false),
            Some(KeyCommand::Redo)
        );
        assert_eq!(
            ShortcutRegistry::resolve("y", Modifiers::ctrl(), false),
            Some(KeyCommand::Redo)
        );
    }

    #[test]
    fn test_drawing_chords_while_drawing() {
        let cmd = Modifiers {
            meta: true,
            ..Modifiers::default()
        };
        assert_eq!(
            ShortcutRegistry::resolve("z", cmd, true),
            Some(KeyCommand::DrawingUndo)
        );
        assert_eq!(
            ShortcutRegistry::resolve("z", Modifiers::ctrl_shift(), true),
            Some(KeyCommand::DrawingRedo)
        );
        assert_eq!(
            ShortcutRegistry::resolve("y", Modifiers::ctrl(), true),
            Some(KeyCommand::Redo)
        );
    }

    #[test]
    fn test_plain_keys() {
        let none = Modifiers::default();
        assert_eq!(
            ShortcutRegistry::resolve("Backspace", none, false),
            Some(KeyCommand::DeleteSelection)
        );
        assert_eq!(
            ShortcutRegistry::resolve("Escape", none, true),
            Some(KeyCommand::Cancel)
        );
        assert!(ShortcutRegistry::resolve("z", none, false).is_none());
    }

    #[test]
    fn test_format() {
        let formatted: Vec<_> = ShortcutRegistry::all().iter().map(Shortcut::format).collect();
        assert!(formatted.contains(&"Ctrl+Shift+Z".to_string()));
    }
}
