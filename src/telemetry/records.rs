use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One row of the nodes snapshot, as the telemetry service serves it.
#[derive(Clone, Debug, Deserialize)]
pub struct NodeRecord {
    pub node_id: String,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub battery_level: Option<f32>,
    #[serde(default)]
    pub total_packets_received: Option<u64>,
    #[serde(default)]
    pub last_seen_utc: Option<DateTime<Utc>>,
}

impl NodeRecord {
    pub fn display_name(&self) -> &str {
        self.long_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.short_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.node_id)
    }

    /// Activity band from last-seen age: under 5 minutes is online, under
    /// an hour is recent, everything else (including no reading) offline.
    pub fn presence(&self, now: DateTime<Utc>) -> Presence {
        let Some(last_seen) = self.last_seen_utc else {
            return Presence::Offline;
        };

        let age = now.signed_duration_since(last_seen);
        if age.num_minutes() < 5 {
            Presence::Online
        } else if age.num_minutes() < 60 {
            Presence::Recent
        } else {
            Presence::Offline
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    Online,
    Recent,
    Offline,
}

impl Presence {
    pub fn label(self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Recent => "Recent",
            Self::Offline => "Offline",
        }
    }
}

/// One observed radio link. Directional as stored (the reporting node is
/// the source) but semantically undirected.
#[derive(Clone, Debug, Deserialize)]
pub struct LinkRecord {
    pub source_node_id: String,
    pub neighbor_node_id: String,
    #[serde(default)]
    pub link_quality_score: f32,
    #[serde(default)]
    pub avg_snr: Option<f32>,
    #[serde(default)]
    pub avg_rssi: Option<f32>,
    #[serde(default)]
    pub total_packets: u64,
    #[serde(default)]
    pub last_heard_utc: Option<DateTime<Utc>>,
}

/// Hop-distance graph, pre-computed upstream from the local node's
/// distance vector. Distinct source from the raw link records.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct HopGraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<HopNode>,
    #[serde(default)]
    pub edges: Vec<HopEdge>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HopNode {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "unknown_hops")]
    pub hops: i32,
    #[serde(default)]
    pub battery: Option<f32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HopEdge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub hops: i32,
}

fn unknown_hops() -> i32 {
    99
}

/// A complete refresh cycle's worth of telemetry, swapped into the model
/// atomically.
#[derive(Clone, Debug, Default)]
pub struct MeshSnapshot {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
    pub hop_graph: HopGraphSnapshot,
}
