use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use crate::graph::{EdgeKind, NodeKind};

use super::super::render_utils::{
    blend_color, circle_visible, draw_background, edge_visible, kind_color, node_radius,
    with_opacity, world_to_screen,
};
use super::super::{SearchMatchCache, ViewModel};

const SEARCH_MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<String>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let revision = self.controller.revision();
        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matches = Arc::new(
            self.controller
                .search(query)
                .into_iter()
                .map(|hit| hit.id)
                .collect::<HashSet<_>>(),
        );
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    /// Centers the view on the best search hit.
    fn apply_search_focus(&mut self) {
        if !std::mem::take(&mut self.focus_requested) {
            return;
        }

        let Some(hit) = self.controller.search(&self.search).into_iter().next() else {
            return;
        };
        if let Some(position) = self.controller.simulation().position(&hit.id) {
            self.pan = -(position * self.zoom);
            self.selected = Some(hit.id);
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_graph_zoom(ui, rect, &response);
        self.apply_search_focus();

        if (self.live_physics || self.controller.dragging().is_some()) && self.controller.tick() {
            ui.ctx().request_repaint();
        }

        let frame = self.controller.frame();
        let screen_positions = frame
            .nodes
            .iter()
            .map(|node| world_to_screen(rect, self.pan, self.zoom, node.position))
            .collect::<Vec<_>>();
        let screen_radii = frame
            .nodes
            .iter()
            .map(|node| node_radius(node.kind, self.zoom))
            .collect::<Vec<_>>();

        let (hover_pos, press_origin) =
            ui.input(|input| (input.pointer.hover_pos(), input.pointer.press_origin()));
        let hovered = Self::node_at(hover_pos, &screen_positions, &screen_radii)
            .filter(|_| response.hovered() || self.controller.dragging().is_some());
        let pressed = Self::node_at(press_origin, &screen_positions, &screen_radii);
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        self.handle_graph_pointer(
            ui,
            rect,
            &response,
            hovered.map(|index| frame.nodes[index].id.as_str()),
            pressed.map(|index| frame.nodes[index].id.as_str()),
        );

        let search_matches = self.cached_search_matches();
        let zoom_sqrt = self.zoom.sqrt();

        draw_background(&painter, rect, self.pan, self.zoom);

        for edge in &frame.edges {
            let start = world_to_screen(rect, self.pan, self.zoom, edge.from);
            let end = world_to_screen(rect, self.pan, self.zoom, edge.to);
            if !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let width = match edge.kind {
                EdgeKind::Containment => 1.3,
                EdgeKind::CallReference => 0.9,
            } * zoom_sqrt;
            painter.line_segment(
                [start, end],
                Stroke::new(
                    width.clamp(0.5, 3.4),
                    with_opacity(edge.color, edge.opacity),
                ),
            );
        }

        for (index, node) in frame.nodes.iter().enumerate() {
            let position = screen_positions[index];
            let radius = screen_radii[index];
            if !circle_visible(rect, position, radius + 6.0) {
                continue;
            }

            let is_selected = self.selected.as_deref() == Some(node.id.as_str());
            let is_hovered = hovered == Some(index);
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&node.id));

            let base = kind_color(node.kind);
            let color = if is_hovered {
                blend_color(base, Color32::WHITE, 0.25)
            } else if is_match {
                blend_color(base, SEARCH_MATCH_COLOR, 0.6)
            } else {
                base
            };

            painter.circle_filled(position, radius, with_opacity(color, node.opacity));
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    if is_selected { 2.2 } else { 1.0 },
                    with_opacity(
                        if is_selected {
                            SELECTED_COLOR
                        } else {
                            Color32::from_rgba_unmultiplied(15, 15, 15, 190)
                        },
                        node.opacity,
                    ),
                ),
            );

            if node.has_expandable_children {
                let ring = if node.expanded {
                    Color32::from_gray(120)
                } else {
                    Color32::from_gray(225)
                };
                painter.circle_stroke(
                    position,
                    radius + 3.5,
                    Stroke::new(1.2, with_opacity(ring, node.opacity)),
                );
            }

            if node.pinned {
                painter.circle_filled(
                    position,
                    (radius * 0.3).max(1.5),
                    with_opacity(SELECTED_COLOR, node.opacity),
                );
            }

            let always_labelled = matches!(node.kind, NodeKind::Root | NodeKind::Module);
            if is_selected || is_hovered || is_match || always_labelled || self.zoom > 1.1 {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    &node.display_name,
                    FontId::proportional(12.0),
                    with_opacity(Color32::from_gray(238), node.opacity),
                );
            }
        }

        if let Some(index) = hovered {
            let node = &frame.nodes[index];
            let mut text = format!("{}  |  {}", node.display_name, node.kind.label());
            if let Some(graph_node) = self.controller.graph().node(&node.id) {
                text.push_str(&format!("  |  depth {}", graph_node.depth));
            }
            if node.has_expandable_children {
                text.push_str(if node.expanded {
                    "  |  click to collapse"
                } else {
                    "  |  click to expand"
                });
            }
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
