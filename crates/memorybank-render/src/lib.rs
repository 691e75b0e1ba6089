//! Memory Bank Render Library
//!
//! Output side of the client: the knowledge graph as SVG, annotated pages as
//! PNG files, and the thumbnails uploaded with notes.

pub mod export;
mod renderer;
mod svg;

pub use export::{export_page_png, flatten_page, generate_thumbnail, placeholder_thumbnail};
pub use renderer::{GraphRenderer, RenderContext, RenderError, RenderResult};
pub use svg::SvgRenderer;
