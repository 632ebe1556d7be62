use eframe::egui::{Color32, Vec2};

use crate::graph::{EdgeKind, NodeKind};

/// Everything the drawing layer needs for one tick, in world coordinates.
#[derive(Clone, Debug, Default)]
pub struct RenderFrame {
    pub nodes: Vec<NodeSprite>,
    pub edges: Vec<EdgeSprite>,
}

#[derive(Clone, Debug)]
pub struct NodeSprite {
    pub id: String,
    pub position: Vec2,
    pub kind: NodeKind,
    pub display_name: String,
    pub has_expandable_children: bool,
    pub expanded: bool,
    pub pinned: bool,
    pub opacity: f32,
}

#[derive(Clone, Debug)]
pub struct EdgeSprite {
    pub source_id: String,
    pub target_id: String,
    pub from: Vec2,
    pub to: Vec2,
    pub kind: EdgeKind,
    pub color: Color32,
    pub opacity: f32,
}

#[cfg(test)]
impl RenderFrame {
    pub fn node(&self, id: &str) -> Option<&NodeSprite> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, source_id: &str, target_id: &str) -> Option<&EdgeSprite> {
        self.edges
            .iter()
            .find(|edge| edge.source_id == source_id && edge.target_id == target_id)
    }
}
