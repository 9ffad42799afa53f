mod adjacency;
mod hops;

pub use adjacency::{AdjacencyIndex, NeighborSummary};
pub use hops::{ClassifiedEdge, ClassifiedGraph, ClassifiedNode, HopBand};
