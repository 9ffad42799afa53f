use std::collections::HashSet;
use std::sync::Arc;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::topology::ClassifiedGraph;

use super::TopologyModel;

/// Fuzzy matches for the current search query, cached until the query or the
/// underlying graph changes. Shared as an `Arc` so hosts can hold the set
/// across frames without copying it.
pub(super) struct SearchMatchCache {
    query: String,
    revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl TopologyModel {
    /// Indices of graph nodes the search query highlights, in classified
    /// graph order (which the layout engine preserves). Returns `None` when
    /// a node is selected or the query is empty; selection wins over search.
    pub fn search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        if self.selected.is_some() {
            return None;
        }

        let query = self.filter.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cache) = &self.search_cache
            && cache.query == query
            && cache.revision == self.revision
        {
            return Some(Arc::clone(&cache.matches));
        }

        let matches = Arc::new(compute_matches(&self.graph, query));
        self.search_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            revision: self.revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }
}

fn compute_matches(graph: &ClassifiedGraph, query: &str) -> HashSet<usize> {
    let matcher = SkimMatcherV2::default();

    graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            fuzzy_score(&matcher, &node.label, query).is_some()
                || fuzzy_score(&matcher, &node.id, query).is_some()
        })
        .map(|(index, _)| index)
        .collect()
}

/// Skim scores are case-sensitive for uppercase queries; retry lowercased so
/// "GATE" still finds "gateway".
fn fuzzy_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher.fuzzy_match(text, query).or_else(|| {
        let text = text.to_lowercase();
        let query = query.to_lowercase();
        matcher.fuzzy_match(&text, &query)
    })
}
