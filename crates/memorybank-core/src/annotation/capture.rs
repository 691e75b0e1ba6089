//! Stroke capture: pointer events to composited strokes.

use crate::camera::PageViewport;
use crate::input::{PointerEvent, PointerSample, PointerType};
use crate::raster::Surface;
use crate::tools::Tool;

/// What the host should do after a pointer event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEffect {
    /// Event did not affect drawing.
    Ignored,
    /// Touch input: not drawn, left to the pan/zoom gestures.
    PassThrough,
    /// A stroke began; capture the pointer so the stroke stays continuous.
    Started { pointer_id: i32 },
    /// A segment was committed to the surface.
    Drew,
    /// The stroke ended; release the pointer and flush the page.
    Finished { pointer_id: i32 },
}

/// Tracks the stroke in progress.
///
/// Each move commits its segment immediately and restarts the path at the
/// new point, so a dropped frame never loses more than one segment.
#[derive(Debug, Clone, Default)]
pub struct StrokeCapture {
    active_pointer: Option<i32>,
}

impl StrokeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.active_pointer.is_some()
    }

    pub fn handle(
        &mut self,
        event: &PointerEvent,
        tool: &Tool,
        viewport: &PageViewport,
        surface: &mut Surface,
    ) -> CaptureEffect {
        match event {
            PointerEvent::Down(sample) => self.pointer_down(sample, tool, viewport, surface),
            PointerEvent::Move(sample) => self.pointer_move(sample, tool, viewport, surface),
            PointerEvent::Up(sample) | PointerEvent::Cancel(sample) | PointerEvent::Leave(sample) => {
                self.pointer_up(sample)
            }
        }
    }

    pub fn pointer_down(
        &mut self,
        sample: &PointerSample,
        tool: &Tool,
        viewport: &PageViewport,
        surface: &mut Surface,
    ) -> CaptureEffect {
        if sample.pointer_type == PointerType::Touch {
            return CaptureEffect::PassThrough;
        }

        let point = viewport.client_to_surface(sample.position);
        let style = tool.stroke_style(sample.pointer_type, sample.pressure);
        surface.set_composite(style.composite);
        surface.set_stroke_color(style.color);
        surface.set_line_width(style.width);
        surface.begin_path();
        surface.move_to(point);

        self.active_pointer = Some(sample.pointer_id);
        CaptureEffect::Started {
            pointer_id: sample.pointer_id,
        }
    }

    pub fn pointer_move(
        &mut self,
        sample: &PointerSample,
        tool: &Tool,
        viewport: &PageViewport,
        surface: &mut Surface,
    ) -> CaptureEffect {
        if sample.pointer_type == PointerType::Touch {
            return CaptureEffect::Ignored;
        }
        match self.active_pointer {
            Some(id) if id == sample.pointer_id => {}
            _ => return CaptureEffect::Ignored,
        }

        let point = viewport.client_to_surface(sample.position);
        if let Some(width) = tool.move_width(sample.pointer_type, sample.pressure) {
            surface.set_line_width(width);
        }
        surface.line_to(point);
        surface.stroke();
        surface.begin_path();
        surface.move_to(point);
        CaptureEffect::Drew
    }

    pub fn pointer_up(&mut self, sample: &PointerSample) -> CaptureEffect {
        match self.active_pointer {
            Some(id) if id == sample.pointer_id => {
                self.active_pointer = None;
                CaptureEffect::Finished { pointer_id: id }
            }
            _ => CaptureEffect::Ignored,
        }
    }

    /// Abandon the stroke without a release event (e.g. page switch).
    pub fn reset(&mut self) -> Option<i32> {
        self.active_pointer.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::InkColor;
    use crate::tools::ToolKind;
    use kurbo::Point;

    fn sample(kind: PointerType, x: f64, y: f64, pressure: f64) -> PointerSample {
        PointerSample::new(kind, Point::new(x, y), pressure)
    }

    #[test]
    fn test_touch_never_draws() {
        let mut capture = StrokeCapture::new();
        let mut surface = Surface::new(50.0, 50.0, 1.0);
        let viewport = PageViewport::default();
        let tool = Tool::default();

        let effect = capture.pointer_down(&sample(PointerType::Touch, 5.0, 5.0, 0.0), &tool, &viewport, &mut surface);
        assert_eq!(effect, CaptureEffect::PassThrough);
        assert!(!capture.is_drawing());
        let effect = capture.pointer_move(&sample(PointerType::Touch, 30.0, 30.0, 0.0), &tool, &viewport, &mut surface);
        assert_eq!(effect, CaptureEffect::Ignored);
        assert!(surface.is_blank());
    }

    #[test]
    fn test_mouse_stroke() {
        let mut capture = StrokeCapture::new();
        let mut surface = Surface::new(50.0, 50.0, 1.0);
        let viewport = PageViewport::default();
        let tool = Tool { width: 4.0, ..Tool::default() };

        let down = capture.pointer_down(&sample(PointerType::Mouse, 5.0, 25.0, 0.0), &tool, &viewport, &mut surface);
        assert_eq!(down, CaptureEffect::Started { pointer_id: 1 });
        // Mouse width is base * 0.75
        assert!((surface.line_width() - 3.0).abs() < f64::EPSILON);

        capture.pointer_move(&sample(PointerType::Mouse, 25.0, 25.0, 0.0), &tool, &viewport, &mut surface);
        capture.pointer_move(&sample(PointerType::Mouse, 45.0, 25.0, 0.0), &tool, &viewport, &mut surface);
        let up = capture.pointer_up(&sample(PointerType::Mouse, 45.0, 25.0, 0.0));
        assert_eq!(up, CaptureEffect::Finished { pointer_id: 1 });

        assert_eq!(surface.pixel_at(Point::new(35.0, 25.0)).unwrap().a, 255);
        assert_eq!(surface.pixel_at(Point::new(35.0, 40.0)).unwrap().a, 0);
    }

    #[test]
    fn test_pen_pressure_updates_width() {
        let mut capture = StrokeCapture::new();
        let mut surface = Surface::new(50.0, 50.0, 1.0);
        let viewport = PageViewport::default();
        let tool = Tool { width: 8.0, ..Tool::default() };

        capture.pointer_down(&sample(PointerType::Pen, 5.0, 5.0, 0.2), &tool, &viewport, &mut surface);
        assert!((surface.line_width() - 4.8).abs() < 1e-9);
        capture.pointer_move(&sample(PointerType::Pen, 10.0, 5.0, 1.0), &tool, &viewport, &mut surface);
        assert!((surface.line_width() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_eraser_keeps_width_on_move() {
        let mut capture = StrokeCapture::new();
        let mut surface = Surface::new(50.0, 50.0, 1.0);
        let viewport = PageViewport::default();
        let tool = Tool { kind: ToolKind::Eraser, color: InkColor::black(), width: 2.0 };

        capture.pointer_down(&sample(PointerType::Pen, 5.0, 5.0, 0.2), &tool, &viewport, &mut surface);
        capture.pointer_move(&sample(PointerType::Pen, 10.0, 5.0, 1.0), &tool, &viewport, &mut surface);
        assert!((surface.line_width() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_coordinates_use_viewport() {
        let mut capture = StrokeCapture::new();
        let mut surface = Surface::new(50.0, 50.0, 2.0);
        let mut viewport = PageViewport::new(2.0);
        viewport.set_origin(Point::new(100.0, 100.0));
        let tool = Tool::default();

        capture.pointer_down(&sample(PointerType::Mouse, 120.0, 140.0, 0.0), &tool, &viewport, &mut surface);
        capture.pointer_move(&sample(PointerType::Mouse, 180.0, 140.0, 0.0), &tool, &viewport, &mut surface);
        // Client (150, 140) lands on page (25, 20)
        assert_eq!(surface.pixel_at(Point::new(25.0, 20.0)).unwrap().a, 255);
        assert_eq!(surface.pixel_at(Point::new(25.0, 30.0)).unwrap().a, 0);
    }

    #[test]
    fn test_move_without_down_ignored() {
        let mut capture = StrokeCapture::new();
        let mut surface = Surface::new(10.0, 10.0, 1.0);
        let effect = capture.pointer_move(
            &sample(PointerType::Mouse, 5.0, 5.0, 0.0),
            &Tool::default(),
            &PageViewport::default(),
            &mut surface,
        );
        assert_eq!(effect, CaptureEffect::Ignored);
        assert_eq!(capture.pointer_up(&sample(PointerType::Mouse, 5.0, 5.0, 0.0)), CaptureEffect::Ignored);
    }
}
