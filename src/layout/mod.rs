//! Force-directed layout for the classified hop graph.
//!
//! The engine owns every node position. Hosts drive it with [`LayoutEngine::tick`]
//! at whatever cadence they repaint, feed pointer events through the
//! `pointer_*` methods, and read positions back from [`LayoutEngine::nodes`].
//! Nothing here spawns threads; a tick is one synchronous pass.

mod build;
mod forces;
mod interaction;
mod quadtree;

pub use interaction::DragGesture;

use std::collections::HashMap;

use emath::Vec2;

use crate::topology::HopBand;
use forces::{
    BARNES_HUT_THETA, accumulate_centering, accumulate_collisions, accumulate_repulsion,
    accumulate_springs,
};
use interaction::PointerCapture;
use quadtree::QuadNode;

const REPULSION_STRENGTH: f32 = 26_000.0;
const REPULSION_SOFTENING: f32 = 540.0;
const SPRING_STRENGTH: f32 = 0.018;
const CENTER_PULL: f32 = 0.0011;
const LOCAL_PULL: f32 = 0.03;
const ACCELERATION: f32 = 0.055;
const MAX_FORCE: f32 = 180.0;
const MAX_SPEED: f32 = 22.0;
const MIN_SLEEP_SPEED: f32 = 0.02;
const MIN_SLEEP_FORCE: f32 = 0.08;

/// Where the simulation currently is. `Initializing` lasts exactly until the
/// first tick after a rebuild; `Settled` means ticks are free until the next
/// material change or drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutPhase {
    Idle,
    Initializing,
    Running,
    Settled,
}

/// Host-tunable force multipliers. All of them are clamped on use, so a
/// slider wired straight to these fields cannot blow the simulation up.
#[derive(Clone, Copy, Debug)]
pub struct LayoutConfig {
    pub repulsion: f32,
    pub spring: f32,
    pub collision: f32,
    pub velocity_damping: f32,
    /// Total kinetic energy below which the simulation snaps to `Settled`.
    /// Kept well under one waking node's worth, so a reheat surviving its
    /// first tick is never cut short.
    pub settle_energy: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            repulsion: 1.0,
            spring: 1.0,
            collision: 1.0,
            velocity_damping: 0.9,
            settle_energy: 1e-4,
        }
    }
}

/// One simulated node. Position and velocity are owned by the engine;
/// everything else is carried along for hosts that draw the graph.
#[derive(Clone, Debug)]
pub struct SimNode {
    pub id: String,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub band: HopBand,
    pub radius: f32,
    pub pinned: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct SimEdge {
    pub from: usize,
    pub to: usize,
    pub(crate) hops: u8,
    pub(crate) rest_length: f32,
    pub(crate) strength: f32,
}

#[derive(Default)]
struct ForceScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
}

pub struct LayoutEngine {
    config: LayoutConfig,
    phase: LayoutPhase,
    nodes: Vec<SimNode>,
    edges: Vec<SimEdge>,
    index_by_id: HashMap<String, usize>,
    capture: Option<PointerCapture>,
    scratch: ForceScratch,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            phase: LayoutPhase::Idle,
            nodes: Vec::new(),
            edges: Vec::new(),
            index_by_id: HashMap::new(),
            capture: None,
            scratch: ForceScratch::default(),
        }
    }

    /// Advances the simulation by `dt` seconds and returns the total kinetic
    /// energy after the step. `Idle` and `Settled` ticks cost nothing.
    pub fn tick(&mut self, dt: f32) -> f32 {
        match self.phase {
            LayoutPhase::Idle | LayoutPhase::Settled => return 0.0,
            LayoutPhase::Initializing => self.phase = LayoutPhase::Running,
            LayoutPhase::Running => {}
        }

        let node_count = self.nodes.len();
        if node_count < 2 {
            for node in &mut self.nodes {
                node.velocity = Vec2::ZERO;
            }
            self.phase = LayoutPhase::Settled;
            return 0.0;
        }

        self.scratch.forces.clear();
        self.scratch.forces.resize(node_count, Vec2::ZERO);
        self.scratch.positions.clear();
        self.scratch.radii.clear();
        for node in &self.nodes {
            self.scratch.positions.push(node.pos);
            self.scratch.radii.push(node.radius);
        }

        let repulsion = REPULSION_STRENGTH * self.config.repulsion.clamp(0.25, 2.6);
        let spring = SPRING_STRENGTH * self.config.spring.clamp(0.2, 2.2);
        let collision = self.config.collision.clamp(0.2, 2.0);
        let damping = self.config.velocity_damping.clamp(0.78, 0.97);
        let time_step_scale = (dt * 60.0).clamp(0.25, 3.0);
        let damping_factor = damping.powf(time_step_scale);

        if let Some(tree) = QuadNode::build(&self.scratch.positions) {
            for (index, force) in self.scratch.forces.iter_mut().enumerate() {
                if self.nodes[index].pinned {
                    continue;
                }
                accumulate_repulsion(
                    &tree,
                    index,
                    &self.scratch.positions,
                    repulsion,
                    REPULSION_SOFTENING,
                    BARNES_HUT_THETA,
                    force,
                );
            }
        }

        accumulate_springs(&self.nodes, &self.edges, spring, &mut self.scratch.forces);
        accumulate_collisions(
            &self.scratch.positions,
            &self.scratch.radii,
            collision,
            &mut self.scratch.forces,
        );
        accumulate_centering(&self.nodes, CENTER_PULL, LOCAL_PULL, &mut self.scratch.forces);

        let mut kinetic_energy = 0.0;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if node.pinned {
                node.velocity = Vec2::ZERO;
                continue;
            }

            let mut force = self.scratch.forces[index];
            let force_sq = force.length_sq();
            if force_sq > MAX_FORCE * MAX_FORCE {
                force *= MAX_FORCE / force_sq.sqrt();
            }

            let mut velocity =
                (node.velocity + (force * (ACCELERATION * time_step_scale))) * damping_factor;
            let mut speed_sq = velocity.length_sq();
            if speed_sq > MAX_SPEED * MAX_SPEED {
                velocity *= MAX_SPEED / speed_sq.sqrt();
                speed_sq = MAX_SPEED * MAX_SPEED;
            }
            if speed_sq < MIN_SLEEP_SPEED * MIN_SLEEP_SPEED
                && force_sq < MIN_SLEEP_FORCE * MIN_SLEEP_FORCE
            {
                velocity = Vec2::ZERO;
            }

            node.velocity = velocity;
            node.pos += velocity * time_step_scale;
            kinetic_energy += 0.5 * velocity.length_sq();
        }

        if kinetic_energy < self.config.settle_energy {
            for node in &mut self.nodes {
                node.velocity = Vec2::ZERO;
            }
            self.phase = LayoutPhase::Settled;
        }

        kinetic_energy
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[SimEdge] {
        &self.edges
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.node_index(id).map(|index| self.nodes[index].pos)
    }

    /// True while a pointer press is held on a node, whether or not it has
    /// crossed the drag threshold yet.
    pub fn pointer_active(&self) -> bool {
        self.capture.is_some()
    }

    pub fn config(&self) -> LayoutConfig {
        self.config
    }

    /// Replaces the tuning parameters and wakes a settled simulation so the
    /// new values are visible immediately.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        if self.phase == LayoutPhase::Settled && !self.nodes.is_empty() {
            self.phase = LayoutPhase::Running;
        }
    }
}
