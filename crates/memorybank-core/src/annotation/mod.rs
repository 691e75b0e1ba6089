//! Annotation session: freehand ink over the pages of a document.
//!
//! The session owns the drawing surface for the visible page, the per-page
//! raster store, the active tool and the gesture trackers. Page navigation
//! always flushes the outgoing page before the incoming page is restored.
//!
//! The surface is rasterised once, at the scale the session was opened with.
//! Zooming only changes the viewport mapping; [`AnnotationSession::display_image`]
//! resamples for display without touching the stored rasters.

mod capture;
mod gestures;
mod store;

pub use capture::{CaptureEffect, StrokeCapture};
pub use gestures::{
    PINCH_ZOOM_FACTOR, PanGesture, PinchGesture, TouchGestures, TouchOutcome, WHEEL_ZOOM_FACTOR,
};
pub use store::PageRasterStore;

use crate::camera::PageViewport;
use crate::color::InkColor;
use crate::input::{PointerEvent, PointerType, TouchEvent, WheelEvent};
use crate::raster::{RasterError, Surface};
use crate::tools::{KeyAction, Tool, ToolKind, ToolManager};
use image::RgbaImage;
use kurbo::{Point, Size};
use thiserror::Error;

/// Annotation errors.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Page {page} is out of range (1..={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for annotation operations.
pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// Parameters for opening an annotation session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub page_count: u32,
    /// Page size in logical units (PDF points at 100%).
    pub page_size: Size,
    /// Initial page scale, also the resolution the surface is rasterised at.
    pub scale: f64,
    /// Ignore all drawing input.
    pub read_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_count: 1,
            // A4 in PDF points
            page_size: Size::new(595.0, 842.0),
            scale: 1.0,
            read_only: false,
        }
    }
}

/// State of one annotation view.
#[derive(Debug, Clone)]
pub struct AnnotationSession {
    current_page: u32,
    page_count: u32,
    page_size: Size,
    read_only: bool,
    tools: ToolManager,
    viewport: PageViewport,
    surface: Surface,
    store: PageRasterStore,
    capture: StrokeCapture,
    /// Surface holds ink not yet flushed to the store.
    dirty: bool,
    gestures: TouchGestures,
    input_mode: Option<PointerType>,
    /// Accumulated container scroll produced by pan gestures.
    scroll: kurbo::Vec2,
}

impl AnnotationSession {
    pub fn new(config: SessionConfig) -> Self {
        let viewport = PageViewport::new(config.scale);
        Self {
            current_page: 1,
            page_count: config.page_count.max(1),
            page_size: config.page_size,
            read_only: config.read_only,
            tools: ToolManager::new(),
            surface: Surface::new(config.page_size.width, config.page_size.height, viewport.scale),
            viewport,
            store: PageRasterStore::new(),
            capture: StrokeCapture::new(),
            dirty: false,
            gestures: TouchGestures::default(),
            input_mode: None,
            scroll: kurbo::Vec2::ZERO,
        }
    }

    /// Open a session with previously saved drawing data.
    ///
    /// Malformed data is logged and the session starts with no annotations.
    pub fn with_drawing_data(config: SessionConfig, drawing_data: &str) -> Self {
        let mut session = Self::new(config);
        session.load(drawing_data);
        session
    }

    /// Replace all rasters with the contents of a saved blob and redraw.
    pub fn load(&mut self, drawing_data: &str) {
        self.store = PageRasterStore::deserialize_all(drawing_data);
        log::debug!("Loaded drawing data for {} page(s)", self.store.len());
        self.restore_current();
    }

    fn restore_current(&mut self) {
        if let Err(e) = self.store.restore(self.current_page, &mut self.surface) {
            log::warn!("Failed to restore page {}: {}", self.current_page, e);
            self.surface.clear();
        }
        self.dirty = false;
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_drawing(&self) -> bool {
        self.capture.is_drawing()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn store(&self) -> &PageRasterStore {
        &self.store
    }

    pub fn viewport(&self) -> &PageViewport {
        &self.viewport
    }

    pub fn tool(&self) -> &Tool {
        self.tools.tool()
    }

    /// Last pointer type seen on pointer-down, for the input-mode indicator.
    pub fn input_mode(&self) -> Option<PointerType> {
        self.input_mode
    }

    pub fn scroll_offset(&self) -> kurbo::Vec2 {
        self.scroll
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tools.current = tool;
    }

    pub fn set_tool_kind(&mut self, kind: ToolKind) {
        self.tools.set_kind(kind);
    }

    pub fn set_color(&mut self, color: InkColor) {
        self.tools.set_color(color);
    }

    pub fn set_width(&mut self, width: f64) {
        self.tools.set_width(width);
    }

    pub fn handle_key(&mut self, key: &str) -> KeyAction {
        let action = self.tools.handle_key(key);
        if action == KeyAction::ClearInputMode {
            self.input_mode = None;
        }
        action
    }

    /// Move the surface origin in client space (layout or scroll changed).
    pub fn set_surface_origin(&mut self, origin: Point) {
        self.viewport.set_origin(origin);
    }

    /// Route a pointer event through stroke capture.
    ///
    /// A finished stroke is flushed into the store for the current page.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> AnnotationResult<CaptureEffect> {
        if let PointerEvent::Down(sample) = event {
            if self.read_only {
                return Ok(CaptureEffect::Ignored);
            }
            self.input_mode = Some(sample.pointer_type);
        }

        let tool = *self.tools.tool();
        let effect = self
            .capture
            .handle(event, &tool, &self.viewport, &mut self.surface);
        match effect {
            CaptureEffect::Drew => self.dirty = true,
            CaptureEffect::Finished { .. } => self.flush_current()?,
            _ => {}
        }
        Ok(effect)
    }

    /// Route a touch event to the pan/pinch gestures.
    ///
    /// Pan deltas accumulate into the scroll offset; pinch deltas zoom the page.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> TouchOutcome {
        let outcome = self.gestures.handle(event, self.capture.is_drawing());
        match outcome {
            TouchOutcome::Pan(delta) => {
                self.scroll += delta;
                self.scroll.x = self.scroll.x.max(0.0);
                self.scroll.y = self.scroll.y.max(0.0);
            }
            TouchOutcome::Zoom(delta) => {
                self.zoom_by(delta);
            }
            TouchOutcome::Blocked | TouchOutcome::None => {}
        }
        outcome
    }

    /// Ctrl+wheel zoom. Returns the applied delta.
    pub fn handle_wheel(&mut self, event: &WheelEvent) -> Option<f64> {
        let delta = PinchGesture::wheel(event)?;
        self.zoom_by(delta);
        Some(delta)
    }

    /// Change the page scale. Returns true if it changed.
    ///
    /// Only the viewport mapping changes; the surface and the store keep
    /// their resolution, and a stroke in progress continues.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        self.viewport.set_scale(scale)
    }

    pub fn zoom_by(&mut self, delta: f64) -> bool {
        self.viewport.zoom_by(delta)
    }

    /// The current page as displayed at the viewport scale.
    pub fn display_image(&self) -> RgbaImage {
        self.surface.resampled(self.viewport.scale)
    }

    /// Set the page size once the renderer has measured the page.
    pub fn set_page_size(&mut self, size: Size) -> AnnotationResult<()> {
        if size == self.page_size {
            return Ok(());
        }
        self.flush_current()?;
        self.end_stroke();
        self.page_size = size;
        self.surface = Surface::new(size.width, size.height, self.surface.scale());
        self.restore_current();
        Ok(())
    }

    /// Flush the current page then restore `page`.
    pub fn go_to_page(&mut self, page: u32) -> AnnotationResult<()> {
        if page == 0 || page > self.page_count {
            return Err(AnnotationError::PageOutOfRange {
                page,
                page_count: self.page_count,
            });
        }
        self.flush_current()?;
        self.end_stroke();
        self.current_page = page;
        self.restore_current();
        log::debug!("Switched to page {}/{}", page, self.page_count);
        Ok(())
    }

    /// Advance one page, staying on the last page.
    pub fn next_page(&mut self) -> AnnotationResult<u32> {
        let page = (self.current_page + 1).min(self.page_count);
        if page != self.current_page {
            self.go_to_page(page)?;
        }
        Ok(self.current_page)
    }

    /// Go back one page, staying on the first page.
    pub fn prev_page(&mut self) -> AnnotationResult<u32> {
        let page = self.current_page.saturating_sub(1).max(1);
        if page != self.current_page {
            self.go_to_page(page)?;
        }
        Ok(self.current_page)
    }

    /// Blank the current page and drop its raster.
    pub fn clear_page(&mut self) {
        self.end_stroke();
        self.store.clear(self.current_page, &mut self.surface);
        self.dirty = false;
    }

    /// Snapshot the visible page into the store if it was drawn on.
    ///
    /// A page that was only restored keeps its stored raster as is.
    pub fn flush_current(&mut self) -> AnnotationResult<()> {
        if self.dirty {
            self.store.flush(self.current_page, &self.surface)?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Flush the current page and serialize every page for the notes API.
    pub fn save_payload(&mut self) -> AnnotationResult<String> {
        self.flush_current()?;
        Ok(self.store.serialize_all()?)
    }

    fn end_stroke(&mut self) {
        if let Some(id) = self.capture.reset() {
            log::debug!("Abandoned stroke for pointer {}", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerSample;

    fn config(pages: u32) -> SessionConfig {
        SessionConfig {
            page_count: pages,
            page_size: Size::new(60.0, 60.0),
            scale: 1.0,
            read_only: false,
        }
    }

    fn stroke(session: &mut AnnotationSession, kind: PointerType, from: Point, to: Point) {
        let down = PointerSample::new(kind, from, 0.5);
        let up = PointerSample::new(kind, to, 0.5);
        session.handle_pointer(&PointerEvent::Down(down)).unwrap();
        let mid = Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
        session
            .handle_pointer(&PointerEvent::Move(PointerSample::new(kind, mid, 0.5)))
            .unwrap();
        session.handle_pointer(&PointerEvent::Move(up)).unwrap();
        session.handle_pointer(&PointerEvent::Up(up)).unwrap();
    }

    #[test]
    fn test_stroke_flushes_page() {
        let mut session = AnnotationSession::new(config(3));
        session.set_width(4.0);
        stroke(&mut session, PointerType::Mouse, Point::new(10.0, 30.0), Point::new(50.0, 30.0));

        let snapshot = session.store().get(1).unwrap();
        let decoded = snapshot.decode().unwrap();
        assert_eq!(decoded.get_pixel(30, 30)[3], 255);
        assert_eq!(decoded.get_pixel(30, 5)[3], 0);
    }

    #[test]
    fn test_page_roundtrip_restores_bitmap() {
        let mut session = AnnotationSession::new(config(2));
        session.set_width(4.0);
        stroke(&mut session, PointerType::Pen, Point::new(5.0, 5.0), Point::new(55.0, 55.0));
        let before = session.surface().pixels().to_vec();

        session.go_to_page(2).unwrap();
        assert!(session.surface().is_blank());
        session.go_to_page(1).unwrap();
        assert_eq!(session.surface().pixels(), &before[..]);
    }

    #[test]
    fn test_page_isolation() {
        let mut session = AnnotationSession::new(config(2));
        stroke(&mut session, PointerType::Mouse, Point::new(5.0, 10.0), Point::new(55.0, 10.0));
        session.next_page().unwrap();
        stroke(&mut session, PointerType::Mouse, Point::new(5.0, 50.0), Point::new(55.0, 50.0));
        session.prev_page().unwrap();

        assert!(session.surface().pixel_at(Point::new(30.0, 10.0)).unwrap().a > 0);
        assert_eq!(session.surface().pixel_at(Point::new(30.0, 50.0)).unwrap().a, 0);
        assert_eq!(session.store().len(), 2);
    }

    #[test]
    fn test_navigation_without_release_keeps_ink() {
        let mut session = AnnotationSession::new(config(2));
        let kind = PointerType::Mouse;
        session
            .handle_pointer(&PointerEvent::Down(PointerSample::new(kind, Point::new(5.0, 5.0), 0.0)))
            .unwrap();
        session
            .handle_pointer(&PointerEvent::Move(PointerSample::new(kind, Point::new(40.0, 5.0), 0.0)))
            .unwrap();
        session.go_to_page(2).unwrap();
        assert!(!session.is_drawing());
        assert!(session.store().contains(1));
    }

    #[test]
    fn test_clear_page() {
        let mut session = AnnotationSession::new(config(1));
        stroke(&mut session, PointerType::Mouse, Point::new(5.0, 5.0), Point::new(50.0, 5.0));
        session.clear_page();
        assert!(session.surface().is_blank());
        assert!(!session.store().contains(1));

        let payload = session.save_payload().unwrap();
        assert_eq!(payload, "[]");
    }

    #[test]
    fn test_touch_does_not_draw_and_pans() {
        let mut session = AnnotationSession::new(config(1));
        let effect = session
            .handle_pointer(&PointerEvent::Down(PointerSample::new(
                PointerType::Touch,
                Point::new(10.0, 10.0),
                0.0,
            )))
            .unwrap();
        assert_eq!(effect, CaptureEffect::PassThrough);
        assert_eq!(session.input_mode(), Some(PointerType::Touch));

        session
            .handle_touch(&TouchEvent::Start { touches: vec![Point::new(10.0, 40.0)] });
        let outcome = session
            .handle_touch(&TouchEvent::Move { touches: vec![Point::new(10.0, 10.0)] });
        assert_eq!(outcome, TouchOutcome::Pan(kurbo::Vec2::new(0.0, 30.0)));
        assert!(session.surface().is_blank());
        assert!(session.store().is_empty());
        assert_eq!(session.scroll_offset(), kurbo::Vec2::new(0.0, 30.0));
    }

    #[test]
    fn test_read_only_ignores_input() {
        let mut session = AnnotationSession::new(SessionConfig { read_only: true, ..config(1) });
        stroke(&mut session, PointerType::Pen, Point::new(5.0, 5.0), Point::new(50.0, 50.0));
        assert!(session.surface().is_blank());
        assert!(session.input_mode().is_none());
    }

    #[test]
    fn test_load_and_save_roundtrip() {
        let mut session = AnnotationSession::new(config(3));
        stroke(&mut session, PointerType::Mouse, Point::new(5.0, 5.0), Point::new(50.0, 5.0));
        session.go_to_page(3).unwrap();
        stroke(&mut session, PointerType::Mouse, Point::new(5.0, 20.0), Point::new(50.0, 20.0));
        let payload = session.save_payload().unwrap();

        let reopened = AnnotationSession::with_drawing_data(config(3), &payload);
        assert_eq!(reopened.store(), session.store());
        assert!(!reopened.surface().is_blank());
    }

    #[test]
    fn test_malformed_drawing_data() {
        let session = AnnotationSession::with_drawing_data(config(2), "not json");
        assert!(session.store().is_empty());
        assert!(session.surface().is_blank());
    }

    #[test]
    fn test_page_bounds() {
        let mut session = AnnotationSession::new(config(2));
        assert!(matches!(
            session.go_to_page(3),
            Err(AnnotationError::PageOutOfRange { page: 3, page_count: 2 })
        ));
        assert!(session.go_to_page(0).is_err());
        assert_eq!(session.prev_page().unwrap(), 1);
        assert_eq!(session.next_page().unwrap(), 2);
        assert_eq!(session.next_page().unwrap(), 2);
    }

    /// Thin stroke across the middle of page 1, already flushed.
    fn thin_stroke_session() -> AnnotationSession {
        let mut session = AnnotationSession::new(config(2));
        session.set_width(1.0);
        stroke(&mut session, PointerType::Mouse, Point::new(5.0, 30.5), Point::new(55.0, 30.5));
        assert!(!session.surface().is_blank());
        session
    }

    fn pinch(distance: f64) -> Vec<Point> {
        vec![
            Point::new(30.0 - distance / 2.0, 30.0),
            Point::new(30.0 + distance / 2.0, 30.0),
        ]
    }

    #[test]
    fn test_zoom_in_resamples_display_only() {
        let mut session = AnnotationSession::new(config(1));
        session.set_width(4.0);
        stroke(&mut session, PointerType::Mouse, Point::new(5.0, 30.0), Point::new(55.0, 30.0));
        let before = session.surface().pixels().to_vec();

        assert!(session.set_scale(2.0));
        assert_eq!(session.surface().pixel_size(), (60, 60));
        assert_eq!(session.surface().pixels(), &before[..]);

        let display = session.display_image();
        assert_eq!(display.dimensions(), (120, 120));
        assert_eq!(display.get_pixel(60, 60)[3], 255);
    }

    #[test]
    fn test_zoom_out_and_back_keeps_thin_stroke() {
        let mut session = thin_stroke_session();
        let before = session.surface().pixels().to_vec();
        let stored = session.store().get(1).cloned();

        assert!(session.set_scale(0.5));
        assert_eq!(session.display_image().dimensions(), (30, 30));
        assert!(session.set_scale(1.0));

        assert_eq!(session.surface().pixels(), &before[..]);
        assert_eq!(session.store().get(1), stored.as_ref());

        let payload = session.save_payload().unwrap();
        let saved = PageRasterStore::try_deserialize_all(&payload).unwrap();
        assert_eq!(saved.pages().collect::<Vec<_>>(), vec![1]);
        assert_eq!(saved.get(1).unwrap().decode().unwrap().as_raw(), &before);
    }

    #[test]
    fn test_pinch_sequence_keeps_annotations() {
        let mut session = thin_stroke_session();
        let before = session.surface().pixels().to_vec();
        let stored = session.store().get(1).cloned();

        session.handle_touch(&TouchEvent::Start { touches: pinch(100.0) });
        // Pinch in to the minimum scale, then out past the start
        for step in 1..=5 {
            let outcome = session.handle_touch(&TouchEvent::Move {
                touches: pinch(100.0 - step as f64 * 10.0),
            });
            assert!(matches!(outcome, TouchOutcome::Zoom(d) if d < 0.0));
        }
        assert!((session.viewport().scale - 0.5).abs() < 1e-6);
        assert_eq!(session.store().get(1), stored.as_ref());

        for step in 1..=10 {
            session.handle_touch(&TouchEvent::Move {
                touches: pinch(50.0 + step as f64 * 10.0),
            });
        }
        session.handle_touch(&TouchEvent::End);

        assert!((session.viewport().scale - 1.5).abs() < 1e-6);
        assert_eq!(session.surface().pixels(), &before[..]);
        assert_eq!(session.store().get(1), stored.as_ref());
        assert_eq!(session.scroll_offset(), kurbo::Vec2::ZERO);
    }

    #[test]
    fn test_wheel_zoom_keeps_annotations() {
        let mut session = thin_stroke_session();
        let before = session.surface().pixels().to_vec();
        let stored = session.store().get(1).cloned();

        let plain = WheelEvent { delta: kurbo::Vec2::new(0.0, 500.0), ctrl: false };
        assert_eq!(session.handle_wheel(&plain), None);
        assert!((session.viewport().scale - 1.0).abs() < f64::EPSILON);

        let out = WheelEvent { delta: kurbo::Vec2::new(0.0, 500.0), ctrl: true };
        let delta = session.handle_wheel(&out).unwrap();
        assert!((delta + 0.5).abs() < 1e-9);
        assert!((session.viewport().scale - 0.5).abs() < 1e-9);
        let back = WheelEvent { delta: kurbo::Vec2::new(0.0, -500.0), ctrl: true };
        session.handle_wheel(&back);
        assert!((session.viewport().scale - 1.0).abs() < 1e-9);

        assert_eq!(session.surface().pixels(), &before[..]);
        assert_eq!(session.store().get(1), stored.as_ref());
    }

    #[test]
    fn test_zoom_then_navigate_keeps_page() {
        let mut session = thin_stroke_session();
        let before = session.surface().pixels().to_vec();

        session.set_scale(0.5);
        session.go_to_page(2).unwrap();
        session.set_scale(1.3);
        session.go_to_page(1).unwrap();
        assert_eq!(session.surface().pixels(), &before[..]);
        assert_eq!(session.store().pages().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_drawing_while_zoomed_maps_through_viewport() {
        let mut session = thin_stroke_session();
        let first = session.surface().pixel_at(Point::new(30.0, 30.5));

        session.set_scale(2.0);
        session.set_width(4.0);
        // Client (20, 100)-(100, 100) is page (10, 50)-(50, 50) at 2x
        stroke(&mut session, PointerType::Mouse, Point::new(20.0, 100.0), Point::new(100.0, 100.0));

        assert_eq!(session.surface().pixel_size(), (60, 60));
        assert!(session.surface().pixel_at(Point::new(30.0, 50.0)).unwrap().a > 0);
        assert_eq!(session.surface().pixel_at(Point::new(30.0, 30.5)), first);
        let stored = session.store().get(1).unwrap().decode().unwrap();
        assert_eq!(stored.as_raw(), session.surface().pixels());
    }

    #[test]
    fn test_restored_page_is_not_rewritten() {
        // Saved on another device at half resolution
        let mut small = Surface::new(60.0, 60.0, 0.5);
        small.set_line_width(4.0);
        small.begin_path();
        small.move_to(Point::new(0.0, 30.0));
        small.line_to(Point::new(60.0, 30.0));
        small.stroke();
        let mut saved = PageRasterStore::new();
        saved.flush(1, &small).unwrap();
        let original = saved.get(1).cloned();

        let mut session =
            AnnotationSession::with_drawing_data(config(2), &saved.serialize_all().unwrap());
        assert_eq!(session.surface().pixel_size(), (60, 60));
        assert!(session.surface().pixel_at(Point::new(30.0, 30.0)).unwrap().a > 0);

        session.go_to_page(2).unwrap();
        session.go_to_page(1).unwrap();
        session.save_payload().unwrap();
        assert_eq!(session.store().get(1), original.as_ref());
    }

    #[test]
    fn test_escape_clears_input_mode() {
        let mut session = AnnotationSession::new(config(1));
        stroke(&mut session, PointerType::Pen, Point::new(5.0, 5.0), Point::new(10.0, 5.0));
        assert_eq!(session.input_mode(), Some(PointerType::Pen));
        assert_eq!(session.handle_key("Escape"), KeyAction::ClearInputMode);
        assert!(session.input_mode().is_none());
        session.handle_key("e");
        assert_eq!(session.tool().kind, ToolKind::Eraser);
    }
}
