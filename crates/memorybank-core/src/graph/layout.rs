//! Force-directed layout.
//!
//! A velocity-Verlet simulation with the usual four forces: link springs,
//! many-body repulsion, centring and collision. Cooling follows an alpha
//! schedule that decays towards a target, so dragging a node can reheat the
//! simulation by raising the target.

use super::GraphData;
use kurbo::{Point, Size, Vec2};
use std::collections::HashMap;
use std::f64::consts::PI;

/// Layout seam. Nodes are addressed by their index in [`GraphData::nodes`].
pub trait LayoutEngine {
    /// Rebuild the simulation for a graph inside a viewport of `size`.
    fn reset(&mut self, graph: &GraphData, size: Size);

    /// Advance one step. Returns false once the simulation has cooled.
    fn tick(&mut self) -> bool;

    fn position(&self, index: usize) -> Option<Point>;

    /// Fix a node at `point` until [`LayoutEngine::unpin`].
    fn pin(&mut self, index: usize, point: Point);

    fn unpin(&mut self, index: usize);

    fn set_alpha_target(&mut self, target: f64);

    /// Run until cooled or `max_ticks` steps were taken. Returns the step count.
    fn run(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick() {
            ticks += 1;
        }
        ticks
    }
}

/// Force parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    pub link_distance: f64,
    /// Negative values repel.
    pub charge: f64,
    pub collide_radius: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f64,
}

impl Default for ForceParams {
    fn default() -> Self {
        let alpha_min = 0.001;
        Self {
            link_distance: 100.0,
            charge: -300.0,
            collide_radius: 40.0,
            alpha_min,
            // Cools from 1 to alpha_min in ~300 ticks
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    position: Point,
    velocity: Vec2,
    fixed: Option<Point>,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    source: usize,
    target: usize,
    strength: f64,
    bias: f64,
}

/// Deterministic force simulation.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    pub params: ForceParams,
    bodies: Vec<Body>,
    links: Vec<Link>,
    center: Point,
    alpha: f64,
    alpha_target: f64,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new(ForceParams::default())
    }
}

impl ForceLayout {
    pub fn new(params: ForceParams) -> Self {
        Self {
            params,
            bodies: Vec::new(),
            links: Vec::new(),
            center: Point::ZERO,
            alpha: 1.0,
            alpha_target: 0.0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Restart cooling from full heat.
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
    }

    fn apply_links(&mut self) {
        for (i, link) in self.links.iter().enumerate() {
            let source = self.bodies[link.source];
            let target = self.bodies[link.target];
            let mut delta = (target.position + target.velocity) - (source.position + source.velocity);
            if delta.hypot2() == 0.0 {
                delta = jiggle(i);
            }
            let length = delta.hypot();
            let scale = (length - self.params.link_distance) / length * self.alpha * link.strength;
            let delta = delta * scale;
            self.bodies[link.target].velocity -= delta * link.bias;
            self.bodies[link.source].velocity += delta * (1.0 - link.bias);
        }
    }

    fn apply_charge(&mut self) {
        let n = self.bodies.len();
        for i in 0..n {
            let mut push = Vec2::ZERO;
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut delta = self.bodies[j].position - self.bodies[i].position;
                if delta.hypot2() == 0.0 {
                    delta = jiggle(i * n + j);
                }
                // Clamp very close pairs so forces stay bounded
                let distance_sq = delta.hypot2().max(1.0);
                push += delta * (self.params.charge * self.alpha / distance_sq);
            }
            self.bodies[i].velocity += push;
        }
    }

    fn apply_collisions(&mut self) {
        let n = self.bodies.len();
        let min_distance = self.params.collide_radius * 2.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let a = self.bodies[i];
                let b = self.bodies[j];
                let mut delta = (a.position + a.velocity) - (b.position + b.velocity);
                if delta.hypot2() == 0.0 {
                    delta = jiggle(i * n + j);
                }
                let distance = delta.hypot();
                if distance >= min_distance {
                    continue;
                }
                // Equal radii share the correction evenly
                let correction = delta * ((min_distance - distance) / distance * 0.5);
                self.bodies[i].velocity += correction;
                self.bodies[j].velocity -= correction;
            }
        }
    }

    fn apply_center(&mut self) {
        if self.bodies.is_empty() {
            return;
        }
        let sum = self
            .bodies
            .iter()
            .fold(Vec2::ZERO, |acc, b| acc + b.position.to_vec2());
        let mean = sum / self.bodies.len() as f64;
        let shift = self.center.to_vec2() - mean;
        for body in &mut self.bodies {
            body.position += shift;
        }
    }
}

impl LayoutEngine for ForceLayout {
    fn reset(&mut self, graph: &GraphData, size: Size) {
        self.center = Point::new(size.width / 2.0, size.height / 2.0);
        self.alpha = 1.0;
        self.alpha_target = 0.0;

        // Phyllotaxis spiral so the initial state is spread out and stable
        let golden_angle = PI * (3.0 - 5f64.sqrt());
        self.bodies = (0..graph.nodes.len())
            .map(|i| {
                let radius = 10.0 * (0.5 + i as f64).sqrt();
                let angle = i as f64 * golden_angle;
                Body {
                    position: self.center + Vec2::new(radius * angle.cos(), radius * angle.sin()),
                    velocity: Vec2::ZERO,
                    fixed: None,
                }
            })
            .collect();

        let index: HashMap<&str, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();

        let mut resolved = Vec::with_capacity(graph.edges.len());
        for edge in &graph.edges {
            match (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
                (Some(&source), Some(&target)) => resolved.push((source, target)),
                _ => log::warn!(
                    "Dropping edge {} -> {} with unknown endpoint",
                    edge.source,
                    edge.target
                ),
            }
        }

        let mut degree = vec![0usize; self.bodies.len()];
        for &(source, target) in &resolved {
            degree[source] += 1;
            degree[target] += 1;
        }
        self.links = resolved
            .into_iter()
            .map(|(source, target)| {
                let (ds, dt) = (degree[source] as f64, degree[target] as f64);
                Link {
                    source,
                    target,
                    strength: 1.0 / ds.min(dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect();
    }

    fn tick(&mut self) -> bool {
        if self.alpha < self.params.alpha_min && self.alpha_target < self.params.alpha_min {
            return false;
        }
        self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;

        self.apply_links();
        self.apply_charge();
        self.apply_collisions();
        self.apply_center();

        let keep = 1.0 - self.params.velocity_decay;
        for body in &mut self.bodies {
            match body.fixed {
                Some(point) => {
                    body.position = point;
                    body.velocity = Vec2::ZERO;
                }
                None => {
                    body.velocity *= keep;
                    body.position += body.velocity;
                }
            }
        }
        true
    }

    fn position(&self, index: usize) -> Option<Point> {
        self.bodies.get(index).map(|b| b.fixed.unwrap_or(b.position))
    }

    fn pin(&mut self, index: usize, point: Point) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.fixed = Some(point);
        }
    }

    fn unpin(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.fixed = None;
        }
    }

    fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target;
        if target > self.alpha {
            self.alpha = target;
        }
    }
}

/// Small deterministic offset for coincident points.
fn jiggle(seed: usize) -> Vec2 {
    let angle = seed as f64 * 2.399_963;
    Vec2::new(angle.cos(), angle.sin()) * 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphEdge, GraphNode, NodeKind};

    fn chain(n: usize) -> GraphData {
        let nodes = (0..n)
            .map(|i| GraphNode::new(format!("n{i}"), format!("Node {i}"), NodeKind::Note))
            .collect();
        let edges = (1..n)
            .map(|i| GraphEdge::new(format!("n{}", i - 1), format!("n{i}"), "NEXT"))
            .collect();
        GraphData { nodes, edges }
    }

    #[test]
    fn test_layout_cools_down() {
        let mut layout = ForceLayout::default();
        layout.reset(&chain(5), Size::new(800.0, 600.0));
        let ticks = layout.run(1000);
        assert!(ticks > 0 && ticks < 1000);
        assert!(!layout.tick());
    }

    #[test]
    fn test_layout_centres_graph() {
        let mut layout = ForceLayout::default();
        layout.reset(&chain(6), Size::new(800.0, 600.0));
        layout.run(300);
        let mean = (0..6)
            .map(|i| layout.position(i).unwrap().to_vec2())
            .fold(Vec2::ZERO, |a, b| a + b)
            / 6.0;
        assert!((mean.x - 400.0).abs() < 1.0);
        assert!((mean.y - 300.0).abs() < 1.0);
    }

    #[test]
    fn test_nodes_do_not_overlap() {
        let mut layout = ForceLayout::default();
        layout.reset(&chain(4), Size::new(800.0, 600.0));
        layout.run(300);
        for i in 0..4 {
            for j in (i + 1)..4 {
                let d = (layout.position(i).unwrap() - layout.position(j).unwrap()).hypot();
                assert!(d > 40.0, "nodes {i} and {j} too close: {d}");
            }
        }
    }

    #[test]
    fn test_pinned_node_stays_put() {
        let mut layout = ForceLayout::default();
        layout.reset(&chain(3), Size::new(800.0, 600.0));
        let pin = Point::new(10.0, 10.0);
        layout.pin(1, pin);
        layout.set_alpha_target(0.3);
        for _ in 0..50 {
            layout.tick();
        }
        assert_eq!(layout.position(1), Some(pin));
        layout.unpin(1);
        layout.set_alpha_target(0.0);
        layout.tick();
        assert_ne!(layout.position(1), Some(pin));
    }

    #[test]
    fn test_unknown_edge_endpoint_dropped() {
        let mut graph = chain(2);
        graph.edges.push(GraphEdge::new("n0", "missing", "X"));
        let mut layout = ForceLayout::default();
        layout.reset(&graph, Size::new(100.0, 100.0));
        assert_eq!(layout.links.len(), 1);
    }
}
