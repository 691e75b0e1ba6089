//! Renderer trait abstraction.

use kurbo::Size;
use memorybank_core::graph::{ForceLayout, GraphView, LayoutEngine};
use memorybank_core::raster::RasterError;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Context for rendering one graph frame.
pub struct RenderContext<'a, L: LayoutEngine = ForceLayout> {
    /// The graph view to render.
    pub view: &'a GraphView<L>,
    /// Output size in pixels.
    pub viewport_size: Size,
    pub background_color: Color,
    /// Draw relation labels at edge midpoints.
    pub edge_labels: bool,
}

impl<'a, L: LayoutEngine> RenderContext<'a, L> {
    pub fn new(view: &'a GraphView<L>) -> Self {
        Self {
            view,
            viewport_size: view.size(),
            background_color: Color::from_rgba8(255, 255, 255, 255),
            edge_labels: true,
        }
    }

    pub fn with_viewport_size(mut self, size: Size) -> Self {
        self.viewport_size = size;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_edge_labels(mut self, enabled: bool) -> Self {
        self.edge_labels = enabled;
        self
    }
}

/// Trait for graph rendering backends.
pub trait GraphRenderer {
    type Output;

    fn render_graph<L: LayoutEngine>(&mut self, ctx: &RenderContext<'_, L>) -> Self::Output;
}
