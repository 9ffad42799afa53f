//! Topology model for mesh radio telemetry.
//!
//! Turns flat telemetry snapshots (nodes, pairwise link records, a
//! hop-distance graph) into a symmetric adjacency index, a hop-band
//! classification, and a force-directed layout with drag/pin and
//! click-selection semantics. Rendering, HTTP polling, and everything
//! else view-shaped live in the host; this crate only owns the model.
//!
//! The host drives everything through [`TopologyModel`]: feed it whole
//! snapshots via [`TopologyModel::replace_snapshot`], UI gestures via
//! [`Command`], and animation frames via [`TopologyModel::tick`], then
//! project the derived state into whatever renderer is at hand.

pub mod layout;
pub mod model;
pub mod telemetry;
pub mod topology;
mod util;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid snapshot JSON: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub use layout::{DragGesture, LayoutConfig, LayoutEngine, LayoutPhase};
pub use model::{
    BatteryBand, Command, Connectivity, NetworkStats, NodeFilter, RefreshScheduler, SortKey,
    TopologyModel,
};
pub use telemetry::{LinkRecord, MeshSnapshot, NodeRecord, Presence, load_snapshot};
pub use topology::{AdjacencyIndex, ClassifiedGraph, HopBand, NeighborSummary};
