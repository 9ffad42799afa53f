use std::collections::HashMap;
use std::f32::consts::TAU;

use emath::{Vec2, vec2};

use crate::topology::{ClassifiedGraph, HopBand};
use crate::util::stable_pair;

use super::{LayoutEngine, LayoutPhase, SimEdge, SimNode};

const NODE_RADIUS: f32 = 14.0;
const LOCAL_NODE_RADIUS: f32 = 22.0;
const EDGE_REST_BASE: f32 = 90.0;
const EDGE_REST_PER_HOP: f32 = 42.0;
const SEED_SPEED_BASE: f32 = 1.15;

impl LayoutEngine {
    /// Loads a classified hop graph into the simulation.
    ///
    /// An attribute-only update (same ids, edges, and bands) refreshes node
    /// metadata without touching positions or the phase. A material change
    /// rebuilds the node set, carrying positions over for ids that survive,
    /// and restarts the simulation from `Initializing`.
    pub fn load(&mut self, graph: &ClassifiedGraph) {
        self.capture = None;

        if graph.is_empty() {
            self.nodes.clear();
            self.edges.clear();
            self.index_by_id.clear();
            self.phase = LayoutPhase::Idle;
            return;
        }

        if self.same_topology(graph) {
            return;
        }

        let mut prior = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();

        let mut nodes = Vec::with_capacity(graph.nodes.len());
        for (index, classified) in graph.nodes.iter().enumerate() {
            let radius = if classified.band.is_local() {
                LOCAL_NODE_RADIUS
            } else {
                NODE_RADIUS
            };

            if let Some(mut node) = prior.remove(&classified.id) {
                node.band = classified.band;
                node.radius = radius;
                node.pinned = false;
                nodes.push(node);
            } else {
                nodes.push(seed_node(&classified.id, index, classified.band, radius));
            }
        }

        self.nodes = nodes;
        self.edges = graph
            .edges
            .iter()
            .map(|edge| SimEdge {
                from: edge.from,
                to: edge.to,
                hops: edge.hops,
                rest_length: EDGE_REST_BASE + f32::from(edge.hops) * EDGE_REST_PER_HOP,
                strength: 1.0 / (1.0 + f32::from(edge.hops)),
            })
            .collect();
        self.index_by_id = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        self.phase = LayoutPhase::Initializing;
    }

    /// Simulation nodes track the classified graph by position, so an
    /// index-wise comparison is enough.
    fn same_topology(&self, graph: &ClassifiedGraph) -> bool {
        self.nodes.len() == graph.nodes.len()
            && self.edges.len() == graph.edges.len()
            && self
                .nodes
                .iter()
                .zip(&graph.nodes)
                .all(|(sim, classified)| sim.id == classified.id && sim.band == classified.band)
            && self
                .edges
                .iter()
                .zip(&graph.edges)
                .all(|(sim, classified)| {
                    sim.from == classified.from
                        && sim.to == classified.to
                        && sim.hops == classified.hops
                })
    }
}

/// New nodes start at the origin with a deterministic outward velocity, so
/// the first ticks unfold the graph instead of exploding it. The local node
/// starts at rest and stays the anchor everything else spreads around.
fn seed_node(id: &str, index: usize, band: HopBand, radius: f32) -> SimNode {
    let (jitter_x, jitter_y) = stable_pair(id);
    let mut direction = vec2(jitter_x, jitter_y);
    if direction.length_sq() <= 0.0001 {
        let angle = ((index as f32) * 0.618_034 + 0.11) * TAU;
        direction = vec2(angle.cos(), angle.sin());
    } else {
        direction = direction.normalized();
    }

    let speed = if band.is_local() {
        0.0
    } else {
        SEED_SPEED_BASE + radius * 0.02
    };

    SimNode {
        id: id.to_owned(),
        pos: Vec2::ZERO,
        velocity: direction * speed,
        band,
        radius,
        pinned: false,
    }
}
