//! Input events for pen/mouse/touch handling.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Kind of device behind a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    Mouse,
    Pen,
    Touch,
}

impl PointerType {
    /// Label used by the input-mode indicator.
    pub fn label(self) -> &'static str {
        match self {
            PointerType::Pen => "Pen",
            PointerType::Touch => "Touch",
            PointerType::Mouse => "Mouse",
        }
    }
}

/// A single pointer sample in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    #[serde(default)]
    pub pointer_id: i32,
    pub pointer_type: PointerType,
    /// Position in client coordinates.
    pub position: Point,
    /// Normalized force in [0, 1]. Devices without pressure report 0.
    #[serde(default)]
    pub pressure: f64,
}

impl PointerSample {
    pub fn new(pointer_type: PointerType, position: Point, pressure: f64) -> Self {
        Self {
            pointer_id: 1,
            pointer_type,
            position,
            pressure,
        }
    }

    pub fn with_id(mut self, pointer_id: i32) -> Self {
        self.pointer_id = pointer_id;
        self
    }
}

/// Pointer event type for unified mouse/pen/touch handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PointerEvent {
    Down(PointerSample),
    Move(PointerSample),
    Up(PointerSample),
    Cancel(PointerSample),
    Leave(PointerSample),
}

impl PointerEvent {
    pub fn sample(&self) -> &PointerSample {
        match self {
            PointerEvent::Down(s)
            | PointerEvent::Move(s)
            | PointerEvent::Up(s)
            | PointerEvent::Cancel(s)
            | PointerEvent::Leave(s) => s,
        }
    }

    /// Whether this event ends a stroke.
    pub fn is_release(&self) -> bool {
        matches!(
            self,
            PointerEvent::Up(_) | PointerEvent::Cancel(_) | PointerEvent::Leave(_)
        )
    }
}

/// Raw touch event carrying the positions of all active touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TouchEvent {
    Start { touches: Vec<Point> },
    Move { touches: Vec<Point> },
    End,
}

impl TouchEvent {
    pub fn touches(&self) -> &[Point] {
        match self {
            TouchEvent::Start { touches } | TouchEvent::Move { touches } => touches,
            TouchEvent::End => &[],
        }
    }
}

/// Mouse wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub delta: Vec2,
    /// Ctrl held (pinch gestures on trackpads arrive as ctrl+wheel).
    #[serde(default)]
    pub ctrl: bool,
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_events() {
        let sample = PointerSample::new(PointerType::Pen, Point::new(1.0, 2.0), 0.3);
        assert!(!PointerEvent::Down(sample).is_release());
        assert!(!PointerEvent::Move(sample).is_release());
        assert!(PointerEvent::Up(sample).is_release());
        assert!(PointerEvent::Cancel(sample).is_release());
        assert!(PointerEvent::Leave(sample).is_release());
    }

    #[test]
    fn test_pointer_event_json() {
        let json = r#"{"phase":"down","pointer_type":"pen","position":{"x":10.0,"y":20.0},"pressure":0.8}"#;
        let event: PointerEvent = serde_json::from_str(json).unwrap();
        let sample = event.sample();
        assert_eq!(sample.pointer_type, PointerType::Pen);
        assert_eq!(sample.pointer_id, 0);
        assert!((sample.pressure - 0.8).abs() < f64::EPSILON);
        assert!(matches!(event, PointerEvent::Down(_)));
    }

    #[test]
    fn test_touch_end_has_no_touches() {
        assert!(TouchEvent::End.touches().is_empty());
        let start = TouchEvent::Start {
            touches: vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0)],
        };
        assert_eq!(start.touches().len(), 2);
    }
}
