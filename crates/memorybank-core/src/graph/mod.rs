//! Knowledge graph model: notes and the concepts extracted from them.
//!
//! Topology always comes pre-computed from the API; this module only holds
//! it, lays it out and maps user interaction back to nodes.

mod layout;
mod view;

pub use layout::{ForceLayout, ForceParams, LayoutEngine};
pub use view::{GraphHandler, GraphView, NodeClick};

use crate::color::InkColor;
use serde::{Deserialize, Serialize};

/// Maximum number of characters shown in a node label.
pub const LABEL_MAX_CHARS: usize = 10;

/// Node type as reported by the graph API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Concept,
    Note,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Concept => "Concept",
            NodeKind::Note => "Note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    /// Display label, elided past [`LABEL_MAX_CHARS`].
    pub fn label(&self) -> String {
        truncate_label(&self.name)
    }

    /// Hover text, e.g. `Concept: Entropy`.
    pub fn tooltip(&self) -> String {
        format!("{}: {}", self.kind.name(), self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    /// Relation label drawn at the edge midpoint.
    #[serde(rename = "type")]
    pub relation: String,
}

impl GraphEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
        }
    }
}

/// Graph payload: `{nodes, edges}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Elide names longer than [`LABEL_MAX_CHARS`] characters with `...`.
pub fn truncate_label(name: &str) -> String {
    if name.chars().count() > LABEL_MAX_CHARS {
        let head: String = name.chars().take(LABEL_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

/// Visual encoding of a node by type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    pub radius: f64,
    pub fill: InkColor,
}

impl NodeStyle {
    pub fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Concept => Self {
                radius: 20.0,
                fill: InkColor::rgb(0x63, 0x66, 0xf1),
            },
            NodeKind::Note => Self {
                radius: 15.0,
                fill: InkColor::rgb(0x10, 0xb9, 0x81),
            },
        }
    }
}

/// Concept at the centre of a concept subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptCenter {
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedConcept {
    pub concept: String,
    pub relation: String,
    #[serde(default)]
    pub depth: u32,
}

/// Response of the concept-centred graph endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptGraph {
    pub center: ConceptCenter,
    #[serde(default)]
    pub connected: Vec<ConnectedConcept>,
}

impl ConceptGraph {
    /// Star-shaped node/edge list around the centre concept.
    ///
    /// Concepts are keyed by name; a concept reached more than once keeps a
    /// single node but every relation becomes an edge.
    pub fn into_graph(self) -> GraphData {
        let mut graph = GraphData::default();
        graph.nodes.push(GraphNode::new(
            self.center.name.clone(),
            self.center.name.clone(),
            NodeKind::Concept,
        ));

        for connected in self.connected {
            if graph.node(&connected.concept).is_none() {
                graph.nodes.push(GraphNode::new(
                    connected.concept.clone(),
                    connected.concept.clone(),
                    NodeKind::Concept,
                ));
            }
            graph.edges.push(GraphEdge::new(
                self.center.name.clone(),
                connected.concept,
                connected.relation,
            ));
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("Entropy"), "Entropy");
        assert_eq!(truncate_label("0123456789"), "0123456789");
        assert_eq!(truncate_label("Thermodynamics"), "Thermodyna...");
        // Counted in characters, not bytes
        assert_eq!(truncate_label("열역학의제일법칙과제이법칙"), "열역학의제일법칙과제...");
    }

    #[test]
    fn test_node_style_by_kind() {
        let concept = NodeStyle::for_kind(NodeKind::Concept);
        let note = NodeStyle::for_kind(NodeKind::Note);
        assert!((concept.radius - 20.0).abs() < f64::EPSILON);
        assert!((note.radius - 15.0).abs() < f64::EPSILON);
        assert_eq!(concept.fill.to_hex(), "#6366f1");
        assert_eq!(note.fill.to_hex(), "#10b981");
    }

    #[test]
    fn test_graph_data_wire_format() {
        let json = r#"{
            "nodes": [
                {"id": "n1", "name": "Lecture 3", "type": "Note"},
                {"id": "c1", "name": "Entropy", "type": "Concept"}
            ],
            "edges": [{"source": "n1", "target": "c1", "type": "MENTIONS"}]
        }"#;
        let graph: GraphData = serde_json::from_str(json).unwrap();
        assert_eq!(graph.nodes[0].kind, NodeKind::Note);
        assert_eq!(graph.edges[0].relation, "MENTIONS");
        assert_eq!(graph.node("c1").unwrap().tooltip(), "Concept: Entropy");
    }

    #[test]
    fn test_concept_graph_into_graph() {
        let json = r#"{
            "center": {"name": "Entropy", "user_id": "u1"},
            "connected": [
                {"concept": "Heat", "relation": "RELATED_TO", "depth": 1},
                {"concept": "Order", "relation": "OPPOSITE_OF", "depth": 2},
                {"concept": "Heat", "relation": "PART_OF", "depth": 2}
            ]
        }"#;
        let concept: ConceptGraph = serde_json::from_str(json).unwrap();
        let graph = concept.into_graph();
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 3);
        assert!(graph.nodes.iter().all(|n| n.kind == NodeKind::Concept));
        assert!(graph.edges.iter().all(|e| e.source == "Entropy"));
    }
}
