//! The topology model the host embeds.
//!
//! [`TopologyModel`] owns every piece of derived state: parsed records, the
//! adjacency index, the classified hop graph, and the layout simulation. The
//! host feeds it snapshots and [`Command`]s, ticks it once per frame, and
//! reads projections back. Everything runs on the caller's thread.

mod projector;
mod scheduler;
mod search;

pub use projector::{BatteryBand, Connectivity, NodeFilter, SortKey};
pub use scheduler::{REFRESH_PERIOD, RefreshScheduler};

use std::collections::HashSet;
use std::time::Duration;

use emath::Vec2;

use crate::layout::{DragGesture, LayoutConfig, LayoutEngine};
use crate::telemetry::{MeshSnapshot, NodeRecord};
use crate::topology::{AdjacencyIndex, ClassifiedGraph, HopBand, NeighborSummary};
use search::SearchMatchCache;

/// Everything a host can ask the model to do, in one place. Pointer commands
/// are forwarded to the layout engine; the rest adjust the projection.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Search(String),
    SetConnectivity(Option<Connectivity>),
    SetBattery(Option<BatteryBand>),
    SetSort(SortKey),
    Select(Option<String>),
    DragStart { node_id: String, pos: Vec2 },
    DragMove { pos: Vec2 },
    DragEnd,
}

/// Headline numbers for a status bar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NetworkStats {
    pub node_count: usize,
    pub link_count: usize,
    pub average_connections: f32,
    pub dropped_links: usize,
    pub dropped_hop_edges: usize,
}

pub struct TopologyModel {
    nodes: Vec<NodeRecord>,
    adjacency: AdjacencyIndex,
    graph: ClassifiedGraph,
    layout: LayoutEngine,
    scheduler: RefreshScheduler,
    filter: NodeFilter,
    sort: SortKey,
    selected: Option<String>,
    revision: u64,
    pending: Option<MeshSnapshot>,
    refresh_error: Option<String>,
    search_cache: Option<SearchMatchCache>,
}

impl Default for TopologyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyModel {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            adjacency: AdjacencyIndex::default(),
            graph: ClassifiedGraph::default(),
            layout: LayoutEngine::default(),
            scheduler: RefreshScheduler::default(),
            filter: NodeFilter::default(),
            sort: SortKey::default(),
            selected: None,
            revision: 0,
            pending: None,
            refresh_error: None,
            search_cache: None,
        }
    }

    /// Installs a fresh telemetry snapshot.
    ///
    /// While a pointer gesture is in flight the snapshot is parked instead,
    /// and only the newest parked snapshot survives; it is applied when the
    /// gesture ends. Everything derived is rebuilt atomically, so readers
    /// never observe a half-updated model.
    pub fn replace_snapshot(&mut self, snapshot: MeshSnapshot) {
        if self.layout.pointer_active() {
            tracing::debug!("deferring snapshot during drag");
            self.pending = Some(snapshot);
            return;
        }
        self.apply_snapshot(snapshot);
    }

    /// Records an upstream fetch failure. The previous snapshot stays on
    /// display; the message is held until the next successful refresh.
    pub fn refresh_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("telemetry refresh failed: {message}");
        self.refresh_error = Some(message);
    }

    fn apply_snapshot(&mut self, snapshot: MeshSnapshot) {
        let known_ids = snapshot
            .nodes
            .iter()
            .map(|record| record.node_id.clone())
            .collect::<HashSet<_>>();

        self.adjacency = AdjacencyIndex::build(&snapshot.links, &known_ids);
        self.graph = ClassifiedGraph::from_snapshot(&snapshot.hop_graph);
        self.layout.load(&self.graph);
        self.nodes = snapshot.nodes;

        self.revision += 1;
        self.search_cache = None;
        self.refresh_error = None;

        let selection_gone = self
            .selected
            .as_deref()
            .is_some_and(|id| self.graph.index_of(id).is_none());
        if selection_gone {
            self.selected = None;
        }
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Search(query) => self.filter.search = query,
            Command::SetConnectivity(connectivity) => self.filter.connectivity = connectivity,
            Command::SetBattery(band) => self.filter.battery = band,
            Command::SetSort(sort) => self.sort = sort,
            Command::Select(id) => {
                self.selected = id.filter(|id| self.graph.index_of(id).is_some());
            }
            Command::DragStart { node_id, pos } => self.layout.pointer_down(&node_id, pos),
            Command::DragMove { pos } => self.layout.pointer_move(pos),
            Command::DragEnd => {
                match self.layout.pointer_up() {
                    DragGesture::Click(id) => self.selected = Some(id),
                    DragGesture::Released(_) | DragGesture::None => {}
                }
                if let Some(snapshot) = self.pending.take() {
                    self.apply_snapshot(snapshot);
                }
            }
        }
    }

    /// Advances the layout simulation. Returns the remaining kinetic energy,
    /// which is zero once the graph has settled.
    pub fn tick(&mut self, dt: f32) -> f32 {
        self.layout.tick(dt)
    }

    /// True when the host owes the model a telemetry refresh.
    pub fn refresh_due(&mut self, elapsed: Duration) -> bool {
        self.scheduler.due(elapsed)
    }

    /// The node table after filtering and sorting.
    pub fn projected_nodes(&self) -> Vec<&NodeRecord> {
        projector::project(&self.nodes, &self.adjacency, &self.filter, self.sort)
    }

    pub fn stats(&self) -> NetworkStats {
        let node_count = self.nodes.len();
        let link_count = self.adjacency.link_count();
        let average_connections = if node_count == 0 {
            0.0
        } else {
            (link_count * 2) as f32 / node_count as f32
        };

        NetworkStats {
            node_count,
            link_count,
            average_connections,
            dropped_links: self.adjacency.skipped(),
            dropped_hop_edges: self.graph.dropped_edges(),
        }
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn neighbors(&self, node_id: &str) -> &[NeighborSummary] {
        self.adjacency.neighbors(node_id)
    }

    pub fn connection_count(&self, node_id: &str) -> usize {
        self.adjacency.connection_count(node_id)
    }

    pub fn band_of(&self, node_id: &str) -> HopBand {
        self.graph.band_of(node_id)
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn set_layout_config(&mut self, config: LayoutConfig) {
        self.layout.set_config(config);
    }

    pub fn filter(&self) -> &NodeFilter {
        &self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn refresh_error(&self) -> Option<&str> {
        self.refresh_error.as_deref()
    }

    /// Bumped once per applied snapshot. Cheap way for hosts to notice data
    /// changes without diffing.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
