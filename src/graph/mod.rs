mod build;
mod distance;
mod expansion;
mod kind;

use std::collections::HashMap;

pub use build::{ROOT_ID, build, expandable_ids};
pub use distance::distances_from;
pub use expansion::{ExpansionSet, Toggle};
pub use kind::NodeKind;

#[cfg(test)]
pub(crate) use build::tests::scenario_document;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Containment,
    CallReference,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub display_name: String,
    pub kind: NodeKind,
    pub depth: u8,
    pub has_expandable_children: bool,
    pub parent_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
    pub length_factor: f32,
    pub strength_override: Option<f32>,
}

/// Materialized node/edge set for one (document, expansion) pair.
#[derive(Clone, Debug, Default)]
pub struct FlatGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    index_by_id: HashMap<String, usize>,
}

impl FlatGraph {
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn children_by_parent(&self) -> HashMap<&str, Vec<&str>> {
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for node in &self.nodes {
            if let Some(parent) = node.parent_id.as_deref() {
                children.entry(parent).or_default().push(node.id.as_str());
            }
        }
        children
    }

    fn push_node(&mut self, node: GraphNode) {
        self.index_by_id.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }
}
