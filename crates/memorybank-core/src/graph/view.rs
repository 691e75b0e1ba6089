//! Interactive graph view: layout, camera and pointer interaction.

use super::{GraphData, GraphEdge, GraphNode, NodeKind, NodeStyle};
use super::layout::{ForceLayout, LayoutEngine};
use crate::camera::Camera;
use kurbo::{Point, Size, Vec2};

/// Alpha target while a node is being dragged.
const DRAG_ALPHA_TARGET: f64 = 0.3;

/// Receives node clicks from a [`GraphView`].
pub trait GraphHandler {
    /// A note node was clicked: open the note.
    fn on_navigate(&mut self, note_id: &str);

    /// A concept node was clicked: select it without navigating.
    fn on_select(&mut self, node: &GraphNode);

    /// Dispatch a click by node type.
    fn on_node_click(&mut self, node: &GraphNode) -> NodeClick {
        match node.kind {
            NodeKind::Note => {
                self.on_navigate(&node.id);
                NodeClick::Navigate(node.id.clone())
            }
            NodeKind::Concept => {
                self.on_select(node);
                NodeClick::Select(node.id.clone())
            }
        }
    }
}

/// What a click on a node resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeClick {
    Navigate(String),
    Select(String),
}

/// A graph laid out inside a fixed viewport.
#[derive(Debug, Clone)]
pub struct GraphView<L: LayoutEngine = ForceLayout> {
    graph: GraphData,
    layout: L,
    size: Size,
    pub camera: Camera,
    dragging: Option<usize>,
}

impl GraphView<ForceLayout> {
    pub fn new(graph: GraphData, size: Size) -> Self {
        Self::with_layout(graph, size, ForceLayout::default())
    }
}

impl<L: LayoutEngine> GraphView<L> {
    pub fn with_layout(graph: GraphData, size: Size, mut layout: L) -> Self {
        layout.reset(&graph, size);
        Self {
            graph,
            layout,
            size,
            camera: Camera::new(),
            dragging: None,
        }
    }

    pub fn graph(&self) -> &GraphData {
        &self.graph
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Advance the layout one step.
    pub fn tick(&mut self) -> bool {
        self.layout.tick()
    }

    /// Run the layout until it cools.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        self.layout.run(max_ticks)
    }

    /// Layout position of the node at `index`.
    pub fn position(&self, index: usize) -> Option<Point> {
        self.layout.position(index)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&GraphNode, Point)> {
        self.graph
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| self.layout.position(i).map(|p| (node, p)))
    }

    /// Edges with the layout positions of both endpoints.
    pub fn edges(&self) -> impl Iterator<Item = (&GraphEdge, Point, Point)> {
        self.graph.edges.iter().filter_map(|edge| {
            let source = self.index_of(&edge.source)?;
            let target = self.index_of(&edge.target)?;
            Some((edge, self.layout.position(source)?, self.layout.position(target)?))
        })
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.graph.nodes.iter().position(|n| n.id == id)
    }

    /// Topmost node under a screen point.
    pub fn node_at(&self, screen: Point) -> Option<usize> {
        let world = self.camera.screen_to_world(screen);
        // Later nodes are drawn on top
        self.graph
            .nodes
            .iter()
            .enumerate()
            .rev()
            .find(|(i, node)| {
                self.layout.position(*i).is_some_and(|p| {
                    (p - world).hypot() <= NodeStyle::for_kind(node.kind).radius
                })
            })
            .map(|(i, _)| i)
    }

    /// Pin the node under the pointer and reheat the layout.
    pub fn drag_start(&mut self, screen: Point) -> Option<usize> {
        let index = self.node_at(screen)?;
        let position = self.layout.position(index)?;
        self.layout.set_alpha_target(DRAG_ALPHA_TARGET);
        self.layout.pin(index, position);
        self.dragging = Some(index);
        Some(index)
    }

    pub fn drag_move(&mut self, screen: Point) {
        if let Some(index) = self.dragging {
            let world = self.camera.screen_to_world(screen);
            self.layout.pin(index, world);
        }
    }

    /// Release the dragged node back to the simulation.
    pub fn drag_end(&mut self) -> Option<usize> {
        let index = self.dragging.take()?;
        self.layout.set_alpha_target(0.0);
        self.layout.unpin(index);
        Some(index)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Zoom around a screen point; scale stays within the camera bounds.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        self.camera.zoom_at(screen, factor);
    }

    pub fn wheel(&mut self, screen: Point, delta_y: f64) {
        self.camera.wheel_zoom(screen, delta_y);
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.camera.pan(delta);
    }

    /// Hand the clicked node to `handler`.
    pub fn click(&self, screen: Point, handler: &mut dyn GraphHandler) -> Option<NodeClick> {
        let index = self.node_at(screen)?;
        let node = self.graph.nodes.get(index)?;
        log::debug!("Clicked {} node {}", node.kind.name(), node.id);
        Some(handler.on_node_click(node))
    }
}
