//! Keyboard shortcut registry and documentation.

use memorybank_core::tools::{KeyAction, ToolKind};

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Wheel").
    pub fn format(&self) -> String {
        if self.ctrl {
            format!("Ctrl+{}", self.key)
        } else {
            self.key.to_string()
        }
    }
}

/// Registry of annotation view shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("P", false, "Pen"),
            Shortcut::new("H", false, "Highlighter"),
            Shortcut::new("E", false, "Eraser"),
            Shortcut::new("Escape", false, "Clear input mode indicator"),
            Shortcut::new("Wheel", true, "Zoom page"),
            Shortcut::new("Pinch", false, "Zoom page"),
            Shortcut::new("Drag", false, "Scroll page (one finger)"),
        ]
    }

    /// Describe what a key press did, for logging.
    pub fn describe(action: KeyAction) -> Option<&'static str> {
        match action {
            KeyAction::SelectTool(ToolKind::Pen) => Some("Pen"),
            KeyAction::SelectTool(ToolKind::Highlighter) => Some("Highlighter"),
            KeyAction::SelectTool(ToolKind::Eraser) => Some("Eraser"),
            KeyAction::ClearInputMode => Some("Clear input mode indicator"),
            KeyAction::None => None,
        }
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}
