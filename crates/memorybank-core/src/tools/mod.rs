//! Annotation tools and the stroke styles they produce.

use crate::color::InkColor;
use crate::input::PointerType;
use crate::raster::CompositeMode;
use serde::{Deserialize, Serialize};

/// Pressure assumed for input without a pressure sensor.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Eraser strokes are this many times wider than the base width.
pub const ERASER_WIDTH_FACTOR: f64 = 3.0;

/// Alpha byte applied to highlighter ink (0x4D, about 30%).
pub const HIGHLIGHTER_ALPHA: u8 = 0x4D;

/// Colors offered by the tool panel.
pub const PALETTE: [InkColor; 5] = [
    InkColor::rgb(0x00, 0x00, 0x00),
    InkColor::rgb(0xFF, 0x00, 0x00),
    InkColor::rgb(0x00, 0x00, 0xFF),
    InkColor::rgb(0x00, 0xFF, 0x00),
    InkColor::rgb(0xFF, 0xFF, 0x00),
];

/// Base widths offered by the tool panel.
pub const WIDTHS: [f64; 4] = [1.0, 2.0, 4.0, 8.0];

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pen,
    Highlighter,
    Eraser,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Pen => "Pen",
            ToolKind::Highlighter => "Highlighter",
            ToolKind::Eraser => "Eraser",
        }
    }
}

/// Resolved drawing parameters for the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub composite: CompositeMode,
    pub color: InkColor,
    pub width: f64,
}

/// The active tool: kind, ink color and base width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub kind: ToolKind,
    pub color: InkColor,
    pub width: f64,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            kind: ToolKind::Pen,
            color: InkColor::black(),
            width: 2.0,
        }
    }
}

impl Tool {
    /// Width for a given pressure: `base * (0.5 + pressure * 0.5)`.
    pub fn pressure_width(&self, pressure: f64) -> f64 {
        self.width * (0.5 + pressure.clamp(0.0, 1.0) * 0.5)
    }

    /// Style applied when a stroke begins.
    ///
    /// Only pen input reports pressure; mouse input uses [`DEFAULT_PRESSURE`].
    pub fn stroke_style(&self, pointer_type: PointerType, pressure: f64) -> StrokeStyle {
        match self.kind {
            ToolKind::Eraser => StrokeStyle {
                composite: CompositeMode::DestinationOut,
                color: InkColor::black(),
                width: self.width * ERASER_WIDTH_FACTOR,
            },
            ToolKind::Pen | ToolKind::Highlighter => {
                let pressure = if pointer_type == PointerType::Pen {
                    pressure
                } else {
                    DEFAULT_PRESSURE
                };
                let color = if self.kind == ToolKind::Highlighter {
                    self.color.with_alpha(HIGHLIGHTER_ALPHA)
                } else {
                    self.color
                };
                StrokeStyle {
                    composite: CompositeMode::SourceOver,
                    color,
                    width: self.pressure_width(pressure),
                }
            }
        }
    }

    /// Width update while a stroke is in progress.
    ///
    /// Returns `None` when the width stays fixed: non-pen input and the eraser.
    /// A pen reporting zero pressure mid-stroke falls back to [`DEFAULT_PRESSURE`].
    pub fn move_width(&self, pointer_type: PointerType, pressure: f64) -> Option<f64> {
        if pointer_type != PointerType::Pen || self.kind == ToolKind::Eraser {
            return None;
        }
        let pressure = if pressure > 0.0 { pressure } else { DEFAULT_PRESSURE };
        Some(self.pressure_width(pressure))
    }
}

/// Action triggered by a keyboard shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    SelectTool(ToolKind),
    ClearInputMode,
    None,
}

/// Manages the current tool.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current: Tool,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> &Tool {
        &self.current
    }

    /// Switch tool kind, keeping color and width.
    pub fn set_kind(&mut self, kind: ToolKind) {
        self.current.kind = kind;
    }

    pub fn set_color(&mut self, color: InkColor) {
        self.current.color = color;
    }

    pub fn set_width(&mut self, width: f64) {
        if width > 0.0 {
            self.current.width = width;
        }
    }

    /// Map a key press to a tool action and apply it.
    pub fn handle_key(&mut self, key: &str) -> KeyAction {
        let action = match key.to_lowercase().as_str() {
            "p" => KeyAction::SelectTool(ToolKind::Pen),
            "h" => KeyAction::SelectTool(ToolKind::Highlighter),
            "e" => KeyAction::SelectTool(ToolKind::Eraser),
            "escape" => KeyAction::ClearInputMode,
            _ => KeyAction::None,
        };
        if let KeyAction::SelectTool(kind) = action {
            self.set_kind(kind);
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tool() {
        let tm = ToolManager::new();
        assert_eq!(tm.tool().kind, ToolKind::Pen);
        assert_eq!(tm.tool().color, InkColor::black());
        assert!((tm.tool().width - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mouse_uses_default_pressure() {
        let tool = Tool { width: 4.0, ..Tool::default() };
        let style = tool.stroke_style(PointerType::Mouse, 1.0);
        assert_eq!(style.composite, CompositeMode::SourceOver);
        assert!((style.width - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pen_pressure_width() {
        let tool = Tool { width: 4.0, ..Tool::default() };
        let style = tool.stroke_style(PointerType::Pen, 1.0);
        assert!((style.width - 4.0).abs() < f64::EPSILON);
        let style = tool.stroke_style(PointerType::Pen, 0.0);
        assert!((style.width - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_eraser_style() {
        let tool = Tool { kind: ToolKind::Eraser, width: 2.0, ..Tool::default() };
        let style = tool.stroke_style(PointerType::Pen, 0.1);
        assert_eq!(style.composite, CompositeMode::DestinationOut);
        assert!((style.width - 6.0).abs() < f64::EPSILON);
        assert_eq!(tool.move_width(PointerType::Pen, 1.0), None);
    }

    #[test]
    fn test_highlighter_alpha() {
        let tool = Tool {
            kind: ToolKind::Highlighter,
            color: InkColor::rgb(255, 255, 0),
            width: 8.0,
        };
        let style = tool.stroke_style(PointerType::Mouse, 0.0);
        assert_eq!(style.color, InkColor::new(255, 255, 0, HIGHLIGHTER_ALPHA));
        assert_eq!(style.composite, CompositeMode::SourceOver);
    }

    #[test]
    fn test_move_width_only_for_pen() {
        let tool = Tool { width: 2.0, ..Tool::default() };
        assert_eq!(tool.move_width(PointerType::Mouse, 1.0), None);
        assert_eq!(tool.move_width(PointerType::Pen, 1.0), Some(2.0));
        assert_eq!(tool.move_width(PointerType::Pen, 0.0), Some(1.5));
    }

    #[test]
    fn test_key_shortcuts() {
        let mut tm = ToolManager::new();
        assert_eq!(tm.handle_key("h"), KeyAction::SelectTool(ToolKind::Highlighter));
        assert_eq!(tm.tool().kind, ToolKind::Highlighter);
        assert_eq!(tm.handle_key("E"), KeyAction::SelectTool(ToolKind::Eraser));
        assert_eq!(tm.tool().kind, ToolKind::Eraser);
        assert_eq!(tm.handle_key("Escape"), KeyAction::ClearInputMode);
        assert_eq!(tm.handle_key("x"), KeyAction::None);
        assert_eq!(tm.tool().kind, ToolKind::Eraser);
    }

    #[test]
    fn test_invalid_width_ignored() {
        let mut tm = ToolManager::new();
        tm.set_width(0.0);
        assert!((tm.tool().width - 2.0).abs() < f64::EPSILON);
        tm.set_width(WIDTHS[3]);
        assert!((tm.tool().width - 8.0).abs() < f64::EPSILON);
    }
}
