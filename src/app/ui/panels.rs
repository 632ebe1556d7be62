use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Vec2};

use crate::document::ScanRequest;
use crate::interaction::GraphController;
use crate::layout::ForceParams;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(params: ForceParams, document_path: String, scan: ScanRequest) -> Self {
        Self {
            controller: GraphController::new(params),
            document_path,
            scan,
            search: String::new(),
            selected: None,
            focus_requested: false,
            pan: Vec2::ZERO,
            zoom: 1.0,
            live_physics: true,
            load_error: None,
            loading_label: None,
            pending_load: None,
            search_match_cache: None,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, is_loading: bool) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("arch-visualizer");
                    ui.separator();
                    let document = self.controller.document();
                    ui.label(format!("modules: {}", document.module_count()));
                    ui.label(format!("nodes: {}", self.controller.graph().node_count()));
                    ui.label(format!("edges: {}", self.controller.graph().edge_count()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(label) = &self.loading_label {
                            ui.label(format!("loading {label}"));
                            ui.spinner();
                        } else if self.controller.is_settled() {
                            ui.label("layout settled");
                        }
                    });
                });

                if let Some(error) = self.load_error.clone() {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(format!("Load failed: {error}"))
                                .color(Color32::from_rgb(240, 110, 100)),
                        );
                        if ui.small_button("Dismiss").clicked() {
                            self.load_error = None;
                        }
                    });
                }
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui, is_loading));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }
}
