use std::collections::HashMap;

use crate::telemetry::HopGraphSnapshot;

/// Hop-distance band relative to the local node. A closed, ordered
/// categorical scale: `-1` self, `0` direct, `1` one relay, `2..98`
/// multi-hop, `99` (or anything outside the scale) unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HopBand {
    Local,
    Direct,
    Relay,
    MultiHop(u8),
    Unknown,
}

impl HopBand {
    pub fn from_hops(hops: i32) -> Self {
        match hops {
            -1 => Self::Local,
            0 => Self::Direct,
            1 => Self::Relay,
            2..=98 => Self::MultiHop(hops as u8),
            _ => Self::Unknown,
        }
    }

    pub fn hops(self) -> i32 {
        match self {
            Self::Local => -1,
            Self::Direct => 0,
            Self::Relay => 1,
            Self::MultiHop(hops) => i32::from(hops),
            Self::Unknown => 99,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "Self",
            Self::Direct => "Direct",
            Self::Relay => "Relayed",
            Self::MultiHop(_) => "Multi-hop",
            Self::Unknown => "Unknown",
        }
    }

    /// Fill color, shared by the legend, node styling, and text badges.
    /// This is the one place the band palette lives.
    pub fn color(self) -> &'static str {
        match self {
            Self::Local => "#1f77b4",
            Self::Direct => "#2ca02c",
            Self::Relay => "#bcbd22",
            Self::MultiHop(_) => "#ff7f0e",
            Self::Unknown => "#7f7f7f",
        }
    }

    pub fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }
}

#[derive(Clone, Debug)]
pub struct ClassifiedNode {
    pub id: String,
    pub label: String,
    pub band: HopBand,
    pub battery: Option<f32>,
}

/// Undirected, validated edge between two classified nodes, by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassifiedEdge {
    pub from: usize,
    pub to: usize,
    pub hops: u8,
}

/// Hop-graph snapshot after validation: every node carries a band, every
/// edge resolves to two known nodes. This is what the layout engine sees.
#[derive(Clone, Debug, Default)]
pub struct ClassifiedGraph {
    pub nodes: Vec<ClassifiedNode>,
    pub edges: Vec<ClassifiedEdge>,
    index_by_id: HashMap<String, usize>,
    dropped_edges: usize,
}

impl ClassifiedGraph {
    pub fn from_snapshot(snapshot: &HopGraphSnapshot) -> Self {
        let mut nodes = Vec::with_capacity(snapshot.nodes.len());
        let mut index_by_id = HashMap::with_capacity(snapshot.nodes.len());

        for raw in &snapshot.nodes {
            if index_by_id.contains_key(raw.id.as_str()) {
                continue;
            }

            index_by_id.insert(raw.id.clone(), nodes.len());
            nodes.push(ClassifiedNode {
                id: raw.id.clone(),
                label: raw
                    .label
                    .clone()
                    .filter(|label| !label.is_empty())
                    .unwrap_or_else(|| raw.id.clone()),
                band: HopBand::from_hops(raw.hops),
                battery: raw.battery,
            });
        }

        let mut edges = Vec::with_capacity(snapshot.edges.len());
        let mut dropped_edges = 0usize;

        for raw in &snapshot.edges {
            let (Some(&from), Some(&to)) =
                (index_by_id.get(&raw.from), index_by_id.get(&raw.to))
            else {
                dropped_edges += 1;
                tracing::warn!("dropping hop edge {} -> {}: unknown endpoint", raw.from, raw.to);
                continue;
            };

            // Springs need two distinct endpoints.
            if from == to {
                continue;
            }

            let (from, to) = if from <= to { (from, to) } else { (to, from) };
            edges.push(ClassifiedEdge {
                from,
                to,
                hops: raw.hops.clamp(0, 99) as u8,
            });
        }

        // Stable by pair so the first assertion of a duplicate edge wins.
        edges.sort_by_key(|edge| (edge.from, edge.to));
        edges.dedup_by_key(|edge| (edge.from, edge.to));

        Self {
            nodes,
            edges,
            index_by_id,
            dropped_edges,
        }
    }

    /// Total over any id: nodes outside the hop source classify unknown.
    pub fn band_of(&self, id: &str) -> HopBand {
        self.index_by_id
            .get(id)
            .map(|&index| self.nodes[index].band)
            .unwrap_or(HopBand::Unknown)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
