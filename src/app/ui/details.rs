use eframe::egui::{self, RichText, Ui};

use crate::interaction::MAX_HIGHLIGHT_DISTANCE;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Node Details");
        ui.add_space(6.0);

        let focus_id = self
            .controller
            .hovered()
            .map(|hover| hover.id.clone())
            .or_else(|| self.selected.clone());

        match focus_id {
            Some(id) => self.draw_node_details(ui, &id),
            None => {
                ui.label("Hover or click a node in the graph.");
            }
        }

        ui.separator();
        ui.label(RichText::new("Graph").strong());
        let graph = self.controller.graph();
        ui.label(format!("Nodes: {}", graph.node_count()));
        ui.label(format!("Edges: {}", graph.edge_count()));
        ui.label(format!("Expanded: {}", self.controller.expansion().len()));
        ui.label(format!(
            "Cached positions: {}",
            self.controller.position_cache().len()
        ));

        ui.separator();
        ui.label(RichText::new("Simulation").strong());
        let simulation = self.controller.simulation();
        ui.label(format!("Temperature: {:.3}", simulation.alpha()));
        ui.label(format!("Ticks: {}", simulation.ticks()));
        ui.label(format!("Kinetic energy: {:.2}", simulation.kinetic_energy()));
        ui.label(if self.controller.is_settled() {
            "State: settled"
        } else {
            "State: running"
        });

        if let Some(error) = &self.load_error {
            ui.separator();
            ui.label(RichText::new("Last load error").strong());
            ui.label(error.as_str());
        }
    }

    fn draw_node_details(&mut self, ui: &mut Ui, id: &str) {
        let Some(node) = self.controller.graph().node(id).cloned() else {
            ui.label("Selected node is not part of the current graph.");
            return;
        };

        let expanded = self.controller.expansion().contains(id);
        let pinned = self
            .controller
            .simulation()
            .body(id)
            .is_some_and(|body| body.is_pinned());

        ui.label(RichText::new(node.display_name.as_str()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        egui::Grid::new("node_details_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Kind");
                ui.label(node.kind.label());
                ui.end_row();

                ui.label("Depth");
                ui.label(node.depth.to_string());
                ui.end_row();

                ui.label("Parent");
                ui.label(node.parent_id.as_deref().unwrap_or("-"));
                ui.end_row();

                ui.label("Expandable");
                ui.label(if node.has_expandable_children { "yes" } else { "no" });
                ui.end_row();

                ui.label("Expanded");
                ui.label(if expanded { "yes" } else { "no" });
                ui.end_row();

                ui.label("Pinned");
                ui.label(if pinned { "yes" } else { "no" });
                ui.end_row();
            });

        if let Some(hover) = self.controller.hovered()
            && hover.id == id
        {
            let within = hover
                .distances
                .values()
                .filter(|&&distance| distance > 0 && distance <= MAX_HIGHLIGHT_DISTANCE)
                .count();
            ui.label(format!("{within} nodes within {MAX_HIGHLIGHT_DISTANCE} hops"));
        }

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let label = if expanded { "Collapse" } else { "Expand" };
            if ui
                .add_enabled(node.has_expandable_children || expanded, egui::Button::new(label))
                .clicked()
            {
                self.controller.toggle_expansion(id);
            }
            if ui.button("Focus").clicked()
                && let Some(position) = self.controller.simulation().position(id)
            {
                self.pan = -(position * self.zoom);
                self.selected = Some(id.to_owned());
            }
        });
    }
}
