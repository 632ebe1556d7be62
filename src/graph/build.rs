use std::collections::VecDeque;

use crate::document::{CallReference, Declaration, ModuleEntry, SourceDocument};
use crate::util::{module_short_name, truncate_label};

use super::{EdgeKind, ExpansionSet, FlatGraph, GraphEdge, GraphNode, NodeKind};

pub const ROOT_ID: &str = "root";

/// A position in the source hierarchy. Each level knows only how to list
/// its own children; the walker below handles ids, depth and edges.
#[derive(Clone, Copy)]
enum Item<'a> {
    Root(&'a SourceDocument),
    Module(&'a ModuleEntry),
    Declaration(&'a Declaration),
    Call(&'a CallReference),
}

struct Child<'a> {
    item: Item<'a>,
    local_name: &'a str,
    relation: EdgeKind,
}

impl<'a> Item<'a> {
    fn children(self) -> Vec<Child<'a>> {
        match self {
            Self::Root(document) => document
                .modules
                .iter()
                .map(|module| Child {
                    item: Item::Module(module),
                    local_name: module.module.as_str(),
                    relation: EdgeKind::Containment,
                })
                .collect(),
            Self::Module(module) => module
                .declarations
                .iter()
                .map(|declaration| Child {
                    item: Item::Declaration(declaration),
                    local_name: declaration.name.as_str(),
                    relation: EdgeKind::Containment,
                })
                .collect(),
            Self::Declaration(declaration) => declaration
                .calls
                .iter()
                .map(|call| Child {
                    item: Item::Call(call),
                    local_name: call.function.as_str(),
                    relation: EdgeKind::CallReference,
                })
                .collect(),
            Self::Call(_) => Vec::new(),
        }
    }

    fn has_children(self) -> bool {
        match self {
            Self::Root(document) => !document.modules.is_empty(),
            Self::Module(module) => !module.declarations.is_empty(),
            Self::Declaration(declaration) => !declaration.calls.is_empty(),
            Self::Call(_) => false,
        }
    }

    fn kind(self) -> NodeKind {
        match self {
            Self::Root(_) => NodeKind::Root,
            Self::Module(_) => NodeKind::Module,
            Self::Declaration(declaration) => NodeKind::from_declaration_type(&declaration.kind),
            Self::Call(_) => NodeKind::CallTarget,
        }
    }

    fn display_name(self, local_name: &str) -> String {
        match self {
            Self::Root(_) => ROOT_ID.to_owned(),
            Self::Module(module) => module_short_name(&module.module).to_owned(),
            Self::Declaration(_) => truncate_label(local_name),
            Self::Call(call) => call.function.clone(),
        }
    }
}

pub fn build(document: &SourceDocument, expansion: &ExpansionSet) -> FlatGraph {
    build_with(document, &|id| expansion.contains(id))
}

/// Every id the document can materialize with expandable children, i.e. the
/// expansion set reached by opening everything repeatedly.
pub fn expandable_ids(document: &SourceDocument) -> Vec<String> {
    build_with(document, &|_| true)
        .nodes
        .into_iter()
        .filter(|node| node.has_expandable_children)
        .map(|node| node.id)
        .collect()
}

fn build_with(document: &SourceDocument, is_expanded: &dyn Fn(&str) -> bool) -> FlatGraph {
    let mut graph = FlatGraph::default();
    let root = Item::Root(document);
    graph.push_node(GraphNode {
        id: ROOT_ID.to_owned(),
        display_name: root.display_name(ROOT_ID),
        kind: NodeKind::Root,
        depth: 0,
        has_expandable_children: root.has_children(),
        parent_id: None,
    });

    if is_expanded(ROOT_ID) {
        materialize_levels(&mut graph, root, is_expanded);
    }

    graph
}

/// Breadth-first, so a shallower node always claims an id before a deeper
/// one that happens to join to the same string.
fn materialize_levels<'a>(
    graph: &mut FlatGraph,
    root: Item<'a>,
    is_expanded: &dyn Fn(&str) -> bool,
) {
    let mut queue = VecDeque::from([(0usize, root)]);

    while let Some((parent_index, parent)) = queue.pop_front() {
        let parent_node = &graph.nodes[parent_index];
        let parent_id = parent_node.id.clone();
        let parent_kind = parent_node.kind;
        let depth = parent_node.depth + 1;
        let profile = parent_kind.profile();

        for child in parent.children() {
            let id = if parent_kind == NodeKind::Root {
                child.local_name.to_owned()
            } else {
                format!("{parent_id}.{}", child.local_name)
            };

            if graph.contains(&id) {
                tracing::debug!(id = %id, "skipping duplicate node id");
                continue;
            }

            let has_expandable_children = child.item.has_children();
            let index = graph.nodes.len();
            graph.push_node(GraphNode {
                id: id.clone(),
                display_name: child.item.display_name(child.local_name),
                kind: child.item.kind(),
                depth,
                has_expandable_children,
                parent_id: Some(parent_id.clone()),
            });
            graph.edges.push(GraphEdge {
                source_id: parent_id.clone(),
                target_id: id.clone(),
                kind: child.relation,
                length_factor: profile.child_link_factor,
                strength_override: profile.child_link_strength,
            });

            if has_expandable_children && is_expanded(&id) {
                queue.push_back((index, child.item));
            }
        }
    }
}
