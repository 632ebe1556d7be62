use std::collections::HashSet;

use super::{FlatGraph, ROOT_ID};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Expanded,
    /// Carries how many ids left the set (the node plus open descendants).
    Collapsed(usize),
    Ignored,
}

/// Ids whose children are materialized in the flat graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpansionSet {
    open: HashSet<String>,
}

impl Default for ExpansionSet {
    fn default() -> Self {
        Self::root_only()
    }
}

impl ExpansionSet {
    pub fn root_only() -> Self {
        Self::from_ids([ROOT_ID])
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            open: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.open.contains(id)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn toggle(&mut self, id: &str, graph: &FlatGraph) -> Toggle {
        let Some(node) = graph.node(id) else {
            return Toggle::Ignored;
        };

        if id == ROOT_ID && self.contains(id) {
            // The root stays open; toggling it closes everything beneath.
            let removed = self.collapse(id, graph).saturating_sub(1);
            self.open.insert(ROOT_ID.to_owned());
            return if removed == 0 {
                Toggle::Ignored
            } else {
                Toggle::Collapsed(removed)
            };
        }

        if self.contains(id) {
            return Toggle::Collapsed(self.collapse(id, graph));
        }

        if !node.has_expandable_children {
            return Toggle::Ignored;
        }

        self.open.insert(id.to_owned());
        Toggle::Expanded
    }

    /// Removes `id` and every descendant reachable through parent pointers of
    /// `graph`. Ids that merely share a textual prefix are left alone.
    pub fn collapse(&mut self, id: &str, graph: &FlatGraph) -> usize {
        let children = graph.children_by_parent();
        let mut removed = 0usize;
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if self.open.remove(current) {
                removed += 1;
            }
            if let Some(next) = children.get(current) {
                stack.extend(next.iter().copied());
            }
        }

        removed
    }
}
