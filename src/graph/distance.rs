use std::collections::{HashMap, VecDeque};

use super::{GraphEdge, GraphNode};

/// Hop counts from `origin` to every node reachable over edges of either
/// kind, ignoring direction. Unreachable nodes are absent from the map.
pub fn distances_from(
    origin: &str,
    nodes: &[GraphNode],
    edges: &[GraphEdge],
) -> HashMap<String, usize> {
    let index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.as_str(), index))
        .collect::<HashMap<_, _>>();

    let Some(&origin_index) = index_by_id.get(origin) else {
        return HashMap::new();
    };

    let mut adjacency = vec![Vec::new(); nodes.len()];
    for edge in edges {
        if let (Some(&source), Some(&target)) = (
            index_by_id.get(edge.source_id.as_str()),
            index_by_id.get(edge.target_id.as_str()),
        ) {
            adjacency[source].push(target);
            adjacency[target].push(source);
        }
    }

    let mut hops = vec![usize::MAX; nodes.len()];
    hops[origin_index] = 0;
    let mut queue = VecDeque::from([origin_index]);

    while let Some(current) = queue.pop_front() {
        let next_hops = hops[current] + 1;
        for &next in &adjacency[current] {
            if hops[next] == usize::MAX {
                hops[next] = next_hops;
                queue.push_back(next);
            }
        }
    }

    nodes
        .iter()
        .zip(hops)
        .filter(|(_, hops)| *hops != usize::MAX)
        .map(|(node, hops)| (node.id.clone(), hops))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ExpansionSet, build, scenario_document};

    fn scenario_graph() -> crate::graph::FlatGraph {
        build(
            &scenario_document(),
            &ExpansionSet::from_ids(["root", "module", "module.declA"]),
        )
    }

    #[test]
    fn hover_scenario_distances() {
        let graph = scenario_graph();
        let distances = distances_from("module.declA", &graph.nodes, &graph.edges);

        assert_eq!(distances["module.declA"], 0);
        assert_eq!(distances["module"], 1);
        assert_eq!(distances["module.declA.callX"], 1);
        assert_eq!(distances["module.declB"], 2);
        assert_eq!(distances["root"], 2);
    }

    #[test]
    fn origin_is_zero_and_edges_differ_by_at_most_one() {
        let graph = scenario_graph();
        for node in &graph.nodes {
            let distances = distances_from(&node.id, &graph.nodes, &graph.edges);
            assert_eq!(distances[&node.id], 0);
            for edge in &graph.edges {
                let source = distances[&edge.source_id];
                let target = distances[&edge.target_id];
                assert!(source.abs_diff(target) <= 1);
            }
        }
    }

    #[test]
    fn unreachable_nodes_are_omitted() {
        let graph = scenario_graph();
        let distances = distances_from("root", &graph.nodes, &[]);
        assert_eq!(distances.len(), 1);
        assert!(distances_from("missing", &graph.nodes, &graph.edges).is_empty());
    }
}
