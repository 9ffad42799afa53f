use std::collections::HashSet;

use serde::de::Error as _;
use serde_json::Value;

use crate::Result;

use super::records::{HopEdge, HopGraphSnapshot, HopNode, LinkRecord, MeshSnapshot, NodeRecord};

/// Parses all three snapshot documents into one atomic unit.
pub fn parse_snapshot(nodes_raw: &str, links_raw: &str, hops_raw: &str) -> Result<MeshSnapshot> {
    Ok(MeshSnapshot {
        nodes: parse_node_snapshot(nodes_raw)?,
        links: parse_link_snapshot(links_raw)?,
        hop_graph: parse_hop_snapshot(hops_raw)?,
    })
}

/// Parses a nodes snapshot. Elements missing a usable `node_id`, or
/// repeating one already seen, are skipped; the document itself must be a
/// JSON array.
pub fn parse_node_snapshot(raw: &str) -> Result<Vec<NodeRecord>> {
    let values: Vec<Value> = serde_json::from_str(raw)?;

    let mut seen = HashSet::new();
    let (records, skipped) = collect_records(&values, |record: NodeRecord| {
        if record.node_id.is_empty() || !seen.insert(record.node_id.clone()) {
            None
        } else {
            Some(record)
        }
    });

    if skipped > 0 {
        tracing::debug!("skipped {skipped} malformed or duplicate node records");
    }
    Ok(records)
}

/// Parses a link snapshot, shaping each element through the normalizer.
pub fn parse_link_snapshot(raw: &str) -> Result<Vec<LinkRecord>> {
    let values: Vec<Value> = serde_json::from_str(raw)?;
    let (records, skipped) = collect_records(&values, normalize_link);

    if skipped > 0 {
        tracing::debug!("skipped {skipped} malformed link records");
    }
    Ok(records)
}

/// Parses a hop-graph snapshot. Missing `nodes`/`edges` arrays read as
/// empty; malformed elements inside them are skipped.
pub fn parse_hop_snapshot(raw: &str) -> Result<HopGraphSnapshot> {
    let value: Value = serde_json::from_str(raw)?;
    let object = value
        .as_object()
        .ok_or_else(|| serde_json::Error::custom("hop-graph snapshot must be a JSON object"))?;

    let empty = Vec::new();
    let raw_nodes = object.get("nodes").and_then(Value::as_array).unwrap_or(&empty);
    let raw_edges = object.get("edges").and_then(Value::as_array).unwrap_or(&empty);

    let (nodes, node_skips) = collect_records(raw_nodes, |node: HopNode| {
        if node.id.is_empty() { None } else { Some(node) }
    });
    let (edges, edge_skips) = collect_records(raw_edges, |edge: HopEdge| {
        if edge.from.is_empty() || edge.to.is_empty() {
            None
        } else {
            Some(edge)
        }
    });

    if node_skips > 0 || edge_skips > 0 {
        tracing::debug!("skipped {node_skips} hop nodes and {edge_skips} hop edges");
    }
    Ok(HopGraphSnapshot { nodes, edges })
}

/// The LinkRecord normalizer: both endpoints must be present and distinct,
/// quality is clamped onto its 0-100 scale.
fn normalize_link(mut record: LinkRecord) -> Option<LinkRecord> {
    if record.source_node_id.is_empty()
        || record.neighbor_node_id.is_empty()
        || record.source_node_id == record.neighbor_node_id
    {
        return None;
    }

    record.link_quality_score = record.link_quality_score.clamp(0.0, 100.0);
    Some(record)
}

fn collect_records<T, F>(values: &[Value], mut keep: F) -> (Vec<T>, usize)
where
    T: serde::de::DeserializeOwned,
    F: FnMut(T) -> Option<T>,
{
    let mut records = Vec::with_capacity(values.len());
    let mut skipped = 0usize;

    for value in values {
        match T::deserialize(value) {
            Ok(record) => match keep(record) {
                Some(record) => records.push(record),
                None => skipped += 1,
            },
            Err(_) => skipped += 1,
        }
    }

    (records, skipped)
}
