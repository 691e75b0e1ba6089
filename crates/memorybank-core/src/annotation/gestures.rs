//! Touch gestures: single-finger pan and two-finger pinch zoom.

use crate::input::{TouchEvent, WheelEvent};
use kurbo::{Point, Vec2};

/// Zoom delta per pixel of pinch distance change.
pub const PINCH_ZOOM_FACTOR: f64 = 0.01;
/// Zoom delta per wheel pixel while ctrl is held.
pub const WHEEL_ZOOM_FACTOR: f64 = 0.001;

/// Single-finger pan that scrolls the page container.
#[derive(Debug, Clone, Default)]
pub struct PanGesture {
    last: Option<Point>,
}

impl PanGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.last.is_some()
    }

    /// Start panning when exactly one finger is down.
    pub fn start(&mut self, touches: &[Point]) {
        self.last = match touches {
            [finger] => Some(*finger),
            _ => None,
        };
    }

    /// Scroll delta for the container: previous finger position minus the
    /// current one, so content follows the finger.
    pub fn update(&mut self, touches: &[Point]) -> Option<Vec2> {
        let last = self.last?;
        let [finger] = touches else {
            return None;
        };
        self.last = Some(*finger);
        Some(last - *finger)
    }

    pub fn end(&mut self) {
        self.last = None;
    }
}

/// Two-finger pinch tracked by the distance between touches.
#[derive(Debug, Clone, Default)]
pub struct PinchGesture {
    last_distance: f64,
    last_touch_count: usize,
}

impl PinchGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, touches: &[Point]) {
        if let [a, b] = touches {
            self.last_distance = (*a - *b).hypot();
        }
        self.last_touch_count = touches.len();
    }

    /// Additive zoom delta for a two-finger move.
    pub fn update(&mut self, touches: &[Point]) -> Option<f64> {
        let was_pinching = self.last_touch_count == 2;
        self.last_touch_count = touches.len();
        let [a, b] = touches else {
            return None;
        };
        if !was_pinching {
            self.last_distance = (*a - *b).hypot();
            return None;
        }

        let distance = (*a - *b).hypot();
        let delta = if self.last_distance > 0.0 {
            Some((distance - self.last_distance) * PINCH_ZOOM_FACTOR)
        } else {
            None
        };
        self.last_distance = distance;
        delta
    }

    pub fn end(&mut self) {
        self.last_distance = 0.0;
        self.last_touch_count = 0;
    }

    /// Ctrl+wheel acts as a pinch on trackpads.
    pub fn wheel(event: &WheelEvent) -> Option<f64> {
        event.ctrl.then(|| -event.delta.y * WHEEL_ZOOM_FACTOR)
    }
}

/// Outcome of routing a touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchOutcome {
    /// Touch is suppressed because a stroke is in progress.
    Blocked,
    /// Scroll the page container by this delta.
    Pan(Vec2),
    /// Zoom the page by this additive delta.
    Zoom(f64),
    None,
}

/// Combined pan and pinch tracking for one touch stream.
#[derive(Debug, Clone, Default)]
pub struct TouchGestures {
    pub pan: PanGesture,
    pub pinch: PinchGesture,
}

impl TouchGestures {
    /// Route a touch event. While `drawing`, touches are blocked so a resting
    /// palm cannot scroll the page mid-stroke.
    pub fn handle(&mut self, event: &TouchEvent, drawing: bool) -> TouchOutcome {
        match event {
            TouchEvent::Start { touches } => {
                if drawing {
                    return TouchOutcome::Blocked;
                }
                self.pan.start(touches);
                self.pinch.start(touches);
                TouchOutcome::None
            }
            TouchEvent::Move { touches } => {
                if drawing {
                    return TouchOutcome::Blocked;
                }
                if touches.len() == 2 {
                    return self.pinch.update(touches).map_or(TouchOutcome::None, TouchOutcome::Zoom);
                }
                self.pinch.update(touches);
                self.pan.update(touches).map_or(TouchOutcome::None, TouchOutcome::Pan)
            }
            TouchEvent::End => {
                self.pan.end();
                self.pinch.end();
                TouchOutcome::None
            }
        }
    }
}
