//! Memory Bank Core Library
//!
//! Platform-agnostic core logic for the Memory Bank note client: pen input,
//! page rasters, annotation sessions, the knowledge graph view model and
//! session persistence.

pub mod annotation;
pub mod camera;
pub mod color;
pub mod graph;
pub mod input;
pub mod presentation;
pub mod raster;
pub mod session;
pub mod storage;
pub mod tools;

pub use annotation::{AnnotationError, AnnotationSession, PageRasterStore, SessionConfig};
pub use camera::{Camera, PageViewport};
pub use color::InkColor;
pub use graph::{GraphData, GraphEdge, GraphHandler, GraphNode, GraphView, NodeKind};
pub use input::{PointerEvent, PointerSample, PointerType, TouchEvent};
pub use presentation::{ExclusivePresentation, PresentationHost, PresentationState};
pub use raster::{CompositeMode, RasterError, RasterSnapshot, Surface};
pub use session::{LoginRedirect, Session, SessionContext, SessionStore, User, require_session};
pub use storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};
pub use tools::{StrokeStyle, Tool, ToolKind, ToolManager};
