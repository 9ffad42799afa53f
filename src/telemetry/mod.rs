mod load;
mod parse;
mod records;

pub use load::load_snapshot;
pub use parse::{parse_hop_snapshot, parse_link_snapshot, parse_node_snapshot, parse_snapshot};
pub use records::{
    HopEdge, HopGraphSnapshot, HopNode, LinkRecord, MeshSnapshot, NodeRecord, Presence,
};
