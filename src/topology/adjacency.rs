use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::telemetry::LinkRecord;

/// One side of an undirected link, as listed under a node.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborSummary {
    pub neighbor_id: String,
    pub quality: f32,
    pub snr: Option<f32>,
    pub rssi: Option<f32>,
    pub packets: u64,
    pub last_heard: Option<DateTime<Utc>>,
}

/// Symmetric adjacency built from a directional link-record stream.
///
/// Per-node neighbor lists keep insertion order. If A lists B, B lists A,
/// and both summaries come from the same underlying record; the first
/// record seen for an unordered pair wins over later duplicates and
/// reverse assertions.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyIndex {
    neighbors: HashMap<String, Vec<NeighborSummary>>,
    link_count: usize,
    skipped: usize,
}

impl AdjacencyIndex {
    pub fn build(links: &[LinkRecord], known_ids: &HashSet<String>) -> Self {
        let mut index = Self::default();

        for link in links {
            if !known_ids.contains(&link.source_node_id)
                || !known_ids.contains(&link.neighbor_node_id)
            {
                index.skipped += 1;
                continue;
            }

            let forward_inserted =
                index.insert_unique(&link.source_node_id, summary(link, &link.neighbor_node_id));
            index.insert_unique(&link.neighbor_node_id, summary(link, &link.source_node_id));

            if forward_inserted {
                index.link_count += 1;
            }
        }

        if index.skipped > 0 {
            tracing::debug!(
                "skipped {} link records with unknown endpoints",
                index.skipped
            );
        }
        index
    }

    // A scan keeps the invariant: at most one summary per neighbor id,
    // whichever direction was recorded first.
    fn insert_unique(&mut self, node_id: &str, entry: NeighborSummary) -> bool {
        let list = self.neighbors.entry(node_id.to_owned()).or_default();
        if list
            .iter()
            .any(|existing| existing.neighbor_id == entry.neighbor_id)
        {
            return false;
        }
        list.push(entry);
        true
    }

    pub fn neighbors(&self, node_id: &str) -> &[NeighborSummary] {
        self.neighbors.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn connection_count(&self, node_id: &str) -> usize {
        self.neighbors(node_id).len()
    }

    pub fn is_isolated(&self, node_id: &str) -> bool {
        self.connection_count(node_id) == 0
    }

    /// Unique undirected pairs in the index.
    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// Records dropped because an endpoint was not a known node.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

fn summary(link: &LinkRecord, neighbor_id: &str) -> NeighborSummary {
    NeighborSummary {
        neighbor_id: neighbor_id.to_owned(),
        quality: link.link_quality_score,
        snr: link.avg_snr,
        rssi: link.avg_rssi,
        packets: link.total_packets,
        last_heard: link.last_heard_utc,
    }
}
