use std::collections::HashMap;

use eframe::egui::Color32;

/// Hops beyond which hover highlighting bottoms out at [`MIN_OPACITY`].
pub const MAX_HIGHLIGHT_DISTANCE: usize = 3;
pub const MIN_OPACITY: f32 = 0.1;

pub const EDGE_COLOR: Color32 = Color32::from_rgb(120, 132, 150);
pub const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(255, 196, 64);

/// Hover origin plus its hop counts over the current flat graph.
#[derive(Clone, Debug)]
pub struct HoverState {
    pub id: String,
    pub distances: HashMap<String, usize>,
}

impl HoverState {
    pub fn node_opacity(&self, id: &str) -> f32 {
        opacity_for(self.distances.get(id).copied())
    }

    /// Edges fade with the nearer of their two endpoints.
    pub fn edge_opacity(&self, source_id: &str, target_id: &str) -> f32 {
        let nearest = match (self.distances.get(source_id), self.distances.get(target_id)) {
            (Some(source), Some(target)) => Some(*source.min(target)),
            (Some(distance), None) | (None, Some(distance)) => Some(*distance),
            (None, None) => None,
        };
        opacity_for(nearest)
    }

    pub fn edge_color(&self, source_id: &str, target_id: &str) -> Color32 {
        if source_id == self.id || target_id == self.id {
            HIGHLIGHT_COLOR
        } else {
            EDGE_COLOR
        }
    }
}

pub fn opacity_for(distance: Option<usize>) -> f32 {
    let Some(distance) = distance else {
        return MIN_OPACITY;
    };
    let fade = 1.0 - distance as f32 / MAX_HIGHLIGHT_DISTANCE as f32;
    fade.clamp(MIN_OPACITY, 1.0)
}
