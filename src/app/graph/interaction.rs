use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::ViewModel;
use super::super::render_utils::screen_to_world;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    /// Node under `pointer`, nearest center first.
    pub(in crate::app) fn node_at(
        pointer: Option<Pos2>,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = pointer?;
        screen_positions
            .iter()
            .zip(screen_radii)
            .enumerate()
            .filter_map(|(index, (position, radius))| {
                let distance = position.distance(pointer);
                (distance <= *radius).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Routes pointer input on the canvas: hover, click-to-toggle,
    /// drag-to-pin on nodes, and panning on empty space.
    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<&str>,
        pressed: Option<&str>,
    ) {
        if self.controller.dragging().is_none() {
            self.controller.hover(hovered);
        }

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(id) = pressed
            && self.controller.drag_start(id)
        {
            self.selected = Some(id.to_owned());
        }

        if self.controller.dragging().is_some() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let world = screen_to_world(rect, self.pan, self.zoom, pointer);
                self.controller.drag_move(world);
            }
            if response.drag_stopped() || !ui.input(|input| input.pointer.any_down()) {
                self.controller.drag_end();
            }
        } else if response.dragged() {
            self.pan += response.drag_delta();
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(id) = hovered
        {
            self.controller.toggle_expansion(id);
            self.selected = Some(id.to_owned());
        }
    }
}
