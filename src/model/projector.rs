use chrono::{DateTime, Utc};

use crate::telemetry::NodeRecord;
use crate::topology::AdjacencyIndex;
use crate::util::contains_lower;

/// Battery charge bands used by the node list filter. A record without a
/// battery reading matches no band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatteryBand {
    High,
    Medium,
    Low,
}

impl BatteryBand {
    pub fn matches(self, level: Option<f32>) -> bool {
        let Some(level) = level else {
            return false;
        };
        match self {
            Self::High => level >= 60.0,
            Self::Medium => (20.0..=60.0).contains(&level),
            Self::Low => level < 20.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    Isolated,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Battery,
    Packets,
    #[default]
    LastSeen,
}

/// Node list filter. All populated criteria must match.
#[derive(Clone, Debug, Default)]
pub struct NodeFilter {
    /// Case-insensitive substring matched against id, long name, and short name.
    pub search: String,
    pub connectivity: Option<Connectivity>,
    pub battery: Option<BatteryBand>,
}

impl NodeFilter {
    fn matches(&self, record: &NodeRecord, query: &str, adjacency: &AdjacencyIndex) -> bool {
        if !query.is_empty() {
            let hit = contains_lower(&record.node_id, query)
                || record
                    .long_name
                    .as_deref()
                    .is_some_and(|name| contains_lower(name, query))
                || record
                    .short_name
                    .as_deref()
                    .is_some_and(|name| contains_lower(name, query));
            if !hit {
                return false;
            }
        }

        match self.connectivity {
            Some(Connectivity::Connected) if adjacency.is_isolated(&record.node_id) => return false,
            Some(Connectivity::Isolated) if !adjacency.is_isolated(&record.node_id) => return false,
            _ => {}
        }

        if let Some(band) = self.battery
            && !band.matches(record.battery_level)
        {
            return false;
        }

        true
    }
}

/// Applies `filter` then `sort` to the node table and returns borrowed rows
/// in display order. The sort is stable, so records that compare equal keep
/// their snapshot order.
pub(super) fn project<'a>(
    nodes: &'a [NodeRecord],
    adjacency: &AdjacencyIndex,
    filter: &NodeFilter,
    sort: SortKey,
) -> Vec<&'a NodeRecord> {
    let query = filter.search.trim().to_lowercase();

    let mut rows = nodes
        .iter()
        .filter(|record| filter.matches(record, &query, adjacency))
        .collect::<Vec<_>>();

    match sort {
        SortKey::Name => rows.sort_by(|a, b| name_key(a).cmp(&name_key(b))),
        SortKey::Battery => rows.sort_by(|a, b| {
            b.battery_level
                .unwrap_or(0.0)
                .total_cmp(&a.battery_level.unwrap_or(0.0))
        }),
        SortKey::Packets => rows.sort_by(|a, b| {
            b.total_packets_received
                .unwrap_or(0)
                .cmp(&a.total_packets_received.unwrap_or(0))
        }),
        SortKey::LastSeen => rows.sort_by(|a, b| last_seen_key(b).cmp(&last_seen_key(a))),
    }

    rows
}

/// Unnamed nodes sort as the empty string, ahead of every named node. The id
/// is deliberately not a fallback here; it is usually a hex blob.
fn name_key(record: &NodeRecord) -> String {
    record
        .long_name
        .as_deref()
        .or(record.short_name.as_deref())
        .unwrap_or("")
        .to_lowercase()
}

fn last_seen_key(record: &NodeRecord) -> DateTime<Utc> {
    record.last_seen_utc.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::LinkRecord;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn node(id: &str, long: Option<&str>, battery: Option<f32>) -> NodeRecord {
        NodeRecord {
            node_id: id.to_owned(),
            long_name: long.map(str::to_owned),
            short_name: None,
            battery_level: battery,
            total_packets_received: None,
            last_seen_utc: None,
        }
    }

    fn link(source: &str, neighbor: &str) -> LinkRecord {
        LinkRecord {
            source_node_id: source.to_owned(),
            neighbor_node_id: neighbor.to_owned(),
            link_quality_score: 80.0,
            avg_snr: None,
            avg_rssi: None,
            total_packets: 1,
            last_heard_utc: None,
        }
    }

    fn adjacency_for(nodes: &[NodeRecord], links: &[LinkRecord]) -> AdjacencyIndex {
        let known = nodes
            .iter()
            .map(|record| record.node_id.clone())
            .collect::<HashSet<_>>();
        AdjacencyIndex::build(links, &known)
    }

    fn ids(rows: &[&NodeRecord]) -> Vec<String> {
        rows.iter().map(|record| record.node_id.clone()).collect()
    }

    #[test]
    fn search_matches_id_and_names_case_insensitively() {
        let nodes = vec![
            node("!a1b2", Some("Base Station"), None),
            NodeRecord {
                short_name: Some("BASE".to_owned()),
                ..node("!c3d4", None, None)
            },
            node("!e5f6", Some("Rover"), None),
        ];
        let adjacency = adjacency_for(&nodes, &[]);

        let filter = NodeFilter {
            search: "base".to_owned(),
            ..NodeFilter::default()
        };
        let rows = project(&nodes, &adjacency, &filter, SortKey::Name);
        assert_eq!(ids(&rows), vec!["!c3d4", "!a1b2"]);

        let filter = NodeFilter {
            search: "E5F".to_owned(),
            ..NodeFilter::default()
        };
        let rows = project(&nodes, &adjacency, &filter, SortKey::Name);
        assert_eq!(ids(&rows), vec!["!e5f6"]);
    }

    #[test]
    fn connectivity_filter_splits_on_link_count() {
        let nodes = vec![node("a", None, None), node("b", None, None), node("c", None, None)];
        let adjacency = adjacency_for(&nodes, &[link("a", "b")]);

        let connected = NodeFilter {
            connectivity: Some(Connectivity::Connected),
            ..NodeFilter::default()
        };
        assert_eq!(
            ids(&project(&nodes, &adjacency, &connected, SortKey::Name)),
            vec!["a", "b"]
        );

        let isolated = NodeFilter {
            connectivity: Some(Connectivity::Isolated),
            ..NodeFilter::default()
        };
        assert_eq!(
            ids(&project(&nodes, &adjacency, &isolated, SortKey::Name)),
            vec!["c"]
        );
    }

    #[test]
    fn battery_bands_split_on_the_documented_boundaries() {
        assert!(BatteryBand::High.matches(Some(60.0)));
        assert!(BatteryBand::High.matches(Some(100.0)));
        assert!(!BatteryBand::High.matches(Some(59.9)));

        assert!(BatteryBand::Medium.matches(Some(60.0)));
        assert!(BatteryBand::Medium.matches(Some(20.0)));
        assert!(!BatteryBand::Medium.matches(Some(19.9)));

        assert!(BatteryBand::Low.matches(Some(19.9)));
        assert!(!BatteryBand::Low.matches(Some(20.0)));

        assert!(!BatteryBand::High.matches(None));
        assert!(!BatteryBand::Medium.matches(None));
        assert!(!BatteryBand::Low.matches(None));
    }

    #[test]
    fn missing_battery_never_matches_a_band_filter() {
        let nodes = vec![node("a", None, Some(80.0)), node("b", None, None)];
        let adjacency = adjacency_for(&nodes, &[]);
        let filter = NodeFilter {
            battery: Some(BatteryBand::High),
            ..NodeFilter::default()
        };

        assert_eq!(ids(&project(&nodes, &adjacency, &filter, SortKey::Name)), vec!["a"]);
    }

    #[test]
    fn all_criteria_must_match_at_once() {
        let nodes = vec![
            node("alpha", Some("North Gate"), Some(90.0)),
            node("beta", Some("North Field"), Some(10.0)),
            node("gamma", Some("South Gate"), Some(95.0)),
        ];
        let adjacency = adjacency_for(&nodes, &[link("alpha", "beta")]);

        let filter = NodeFilter {
            search: "north".to_owned(),
            connectivity: Some(Connectivity::Connected),
            battery: Some(BatteryBand::High),
        };

        assert_eq!(ids(&project(&nodes, &adjacency, &filter, SortKey::Name)), vec!["alpha"]);
    }

    #[test]
    fn name_sort_is_case_insensitive_with_unnamed_first() {
        let nodes = vec![
            node("1", Some("zulu"), None),
            node("2", Some("Alpha"), None),
            node("3", None, None),
            node("4", Some("bravo"), None),
        ];
        let adjacency = adjacency_for(&nodes, &[]);

        let rows = project(&nodes, &adjacency, &NodeFilter::default(), SortKey::Name);
        assert_eq!(ids(&rows), vec!["3", "2", "4", "1"]);
    }

    #[test]
    fn battery_sort_is_descending_with_missing_as_zero() {
        let nodes = vec![
            node("a", None, Some(15.0)),
            node("b", None, None),
            node("c", None, Some(85.0)),
        ];
        let adjacency = adjacency_for(&nodes, &[]);

        let rows = project(&nodes, &adjacency, &NodeFilter::default(), SortKey::Battery);
        assert_eq!(ids(&rows), vec!["c", "a", "b"]);
    }

    #[test]
    fn packet_sort_is_descending_with_missing_as_zero() {
        let mut high = node("a", None, None);
        high.total_packets_received = Some(500);
        let mut low = node("b", None, None);
        low.total_packets_received = Some(3);
        let nodes = vec![low, node("c", None, None), high];
        let adjacency = adjacency_for(&nodes, &[]);

        let rows = project(&nodes, &adjacency, &NodeFilter::default(), SortKey::Packets);
        assert_eq!(ids(&rows), vec!["a", "b", "c"]);
    }

    #[test]
    fn last_seen_sort_puts_fresh_nodes_first_and_missing_last() {
        let mut old = node("old", None, None);
        old.last_seen_utc = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut fresh = node("fresh", None, None);
        fresh.last_seen_utc = Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        let nodes = vec![old, node("silent", None, None), fresh];
        let adjacency = adjacency_for(&nodes, &[]);

        let rows = project(&nodes, &adjacency, &NodeFilter::default(), SortKey::LastSeen);
        assert_eq!(ids(&rows), vec!["fresh", "old", "silent"]);
    }

    #[test]
    fn equal_sort_keys_keep_snapshot_order() {
        let nodes = vec![
            node("first", None, Some(50.0)),
            node("second", None, Some(50.0)),
            node("third", None, Some(50.0)),
        ];
        let adjacency = adjacency_for(&nodes, &[]);

        let rows = project(&nodes, &adjacency, &NodeFilter::default(), SortKey::Battery);
        assert_eq!(ids(&rows), vec!["first", "second", "third"]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_node() -> impl Strategy<Value = NodeRecord> {
            (
                "[a-f0-9]{4}",
                proptest::option::of("[A-Za-z ]{1,12}"),
                proptest::option::of(0.0f32..=100.0),
                proptest::option::of(0u64..100_000),
            )
                .prop_map(|(id, long, battery, packets)| NodeRecord {
                    node_id: id,
                    long_name: long,
                    short_name: None,
                    battery_level: battery,
                    total_packets_received: packets,
                    last_seen_utc: None,
                })
        }

        proptest! {
            #[test]
            fn projection_never_invents_rows(nodes in proptest::collection::vec(arb_node(), 0..40)) {
                let adjacency = AdjacencyIndex::default();
                let filter = NodeFilter { battery: Some(BatteryBand::High), ..NodeFilter::default() };
                let rows = project(&nodes, &adjacency, &filter, SortKey::Battery);

                prop_assert!(rows.len() <= nodes.len());
                for row in &rows {
                    prop_assert!(BatteryBand::High.matches(row.battery_level));
                }
            }

            #[test]
            fn battery_sort_output_is_monotonic(nodes in proptest::collection::vec(arb_node(), 0..40)) {
                let adjacency = AdjacencyIndex::default();
                let rows = project(&nodes, &adjacency, &NodeFilter::default(), SortKey::Battery);

                for pair in rows.windows(2) {
                    let a = pair[0].battery_level.unwrap_or(0.0);
                    let b = pair[1].battery_level.unwrap_or(0.0);
                    prop_assert!(a >= b);
                }
            }

            #[test]
            fn filtering_and_sorting_are_idempotent(nodes in proptest::collection::vec(arb_node(), 0..40)) {
                let adjacency = AdjacencyIndex::default();
                let filter = NodeFilter { search: "a".to_owned(), ..NodeFilter::default() };

                let once = project(&nodes, &adjacency, &filter, SortKey::Battery)
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>();
                let twice = project(&once, &adjacency, &filter, SortKey::Battery);

                prop_assert_eq!(twice.len(), once.len());
                for (again, first) in twice.iter().zip(&once) {
                    prop_assert_eq!(&again.node_id, &first.node_id);
                }
            }

            #[test]
            fn search_results_all_contain_the_query(nodes in proptest::collection::vec(arb_node(), 0..40)) {
                let adjacency = AdjacencyIndex::default();
                let filter = NodeFilter { search: "a".to_owned(), ..NodeFilter::default() };
                let rows = project(&nodes, &adjacency, &filter, SortKey::Name);

                for row in &rows {
                    let hay = format!(
                        "{} {}",
                        row.node_id,
                        row.long_name.as_deref().unwrap_or("")
                    )
                    .to_lowercase();
                    prop_assert!(hay.contains('a'));
                }
            }
        }
    }
}
