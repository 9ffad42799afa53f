use std::fs;
use std::path::Path;

use crate::Result;

use super::parse::parse_snapshot;
use super::records::MeshSnapshot;

/// Reads the three snapshot documents from disk for a file-backed host.
pub fn load_snapshot(nodes: &Path, links: &Path, hops: &Path) -> Result<MeshSnapshot> {
    let nodes_raw = fs::read_to_string(nodes)?;
    let links_raw = fs::read_to_string(links)?;
    let hops_raw = fs::read_to_string(hops)?;
    parse_snapshot(&nodes_raw, &links_raw, &hops_raw)
}
