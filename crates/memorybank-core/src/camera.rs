//! View transforms: the graph camera and the annotated page viewport.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom bounds for the graph view.
pub const GRAPH_MIN_ZOOM: f64 = 0.1;
pub const GRAPH_MAX_ZOOM: f64 = 10.0;

/// Scale bounds and step for the annotated page.
pub const PAGE_MIN_SCALE: f64 = 0.5;
pub const PAGE_MAX_SCALE: f64 = 2.0;
pub const PAGE_SCALE_STEP: f64 = 0.1;

/// Vertical space reserved for toolbars when fitting a page.
pub const PAGE_FIT_RESERVED_HEIGHT: f64 = 200.0;

/// Camera for the graph view.
///
/// Handles panning (translation) and zooming (scaling), converting between
/// screen coordinates and layout coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan)
    pub offset: Vec2,
    /// Current zoom level
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: GRAPH_MIN_ZOOM,
            max_zoom: GRAPH_MAX_ZOOM,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen-to-layout transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;

        // Keep world_point under screen_point
        let new_screen = self.world_to_screen(world_point);
        self.offset += Vec2::new(screen_point.x - new_screen.x, screen_point.y - new_screen.y);
    }

    /// Zoom from a wheel delta (pixels), `2^(-dy * 0.002)` per event.
    pub fn wheel_zoom(&mut self, screen_point: Point, delta_y: f64) {
        self.zoom_at(screen_point, 2f64.powf(-delta_y * 0.002));
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }
}

/// Placement and scale of the drawing surface over a rendered page.
///
/// The surface is aligned 1:1 with the page image; client coordinates are
/// mapped into page-local coordinates by subtracting the surface origin and
/// dividing by the scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageViewport {
    /// Top-left corner of the surface's bounding box in client coordinates.
    pub origin: Point,
    /// Current scale factor.
    pub scale: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for PageViewport {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            scale: 1.0,
            min_scale: PAGE_MIN_SCALE,
            max_scale: PAGE_MAX_SCALE,
        }
    }
}

impl PageViewport {
    pub fn new(scale: f64) -> Self {
        let mut viewport = Self::default();
        viewport.set_scale(scale);
        viewport
    }

    /// Page-to-client transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2()) * Affine::scale(self.scale)
    }

    /// Map a client point into page-local coordinates.
    pub fn client_to_surface(&self, client: Point) -> Point {
        Point::new(
            (client.x - self.origin.x) / self.scale,
            (client.y - self.origin.y) / self.scale,
        )
    }

    pub fn surface_to_client(&self, surface: Point) -> Point {
        self.transform() * surface
    }

    /// Move the surface origin (e.g. after the container scrolled).
    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Set the scale, clamped to the allowed range. Returns true if it changed.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        let clamped = scale.clamp(self.min_scale, self.max_scale);
        let changed = (clamped - self.scale).abs() > f64::EPSILON;
        self.scale = clamped;
        changed
    }

    /// Additive zoom, as produced by pinch and ctrl+wheel gestures.
    pub fn zoom_by(&mut self, delta: f64) -> bool {
        self.set_scale(self.scale + delta)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom_by(PAGE_SCALE_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom_by(-PAGE_SCALE_STEP)
    }

    /// Fit a page into a container, leaving room for toolbars.
    pub fn fit_to_container(&mut self, page: Size, container: Size) -> bool {
        if page.width <= 0.0 || page.height <= 0.0 || container.width <= 0.0 {
            return false;
        }
        let scale = (container.width / page.width)
            .min((container.height - PAGE_FIT_RESERVED_HEIGHT) / page.height)
            .min(PAGE_MAX_SCALE);
        self.set_scale(scale)
    }
}
