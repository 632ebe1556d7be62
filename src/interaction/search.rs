use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::FlatGraph;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub score: i64,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Nodes of `graph` whose display name or id fuzzily matches `query`, best
/// first. Ties keep graph order.
pub fn search_nodes(graph: &FlatGraph, query: &str) -> Vec<SearchHit> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut hits = graph
        .nodes
        .iter()
        .filter_map(|node| {
            let score = fuzzy_match_score(&matcher, &node.display_name, query)
                .max(fuzzy_match_score(&matcher, &node.id, query))?;
            Some(SearchHit {
                id: node.id.clone(),
                score,
            })
        })
        .collect::<Vec<_>>();
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits
}
