use std::ops::RangeInclusive;
use std::path::PathBuf;

use eframe::egui::{self, Key, Response, Ui};

use crate::document::DocumentSource;

use super::super::ViewModel;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Arrow keys nudge a focused slider, faster the longer they are held.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    range: &RangeInclusive<f32>,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let step = ((range.end() - range.start()) / 200.0).max(0.0005);
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let old_value = *value;
    *value = (*value + direction as f32 * step * speed * delta_time)
        .clamp(*range.start(), *range.end());

    ui.ctx().request_repaint();
    (*value - old_value).abs() > f32::EPSILON
}

fn force_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    let response = ui
        .add(
            egui::Slider::new(value, range.clone())
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hover);
    if response.hovered() {
        response.request_focus();
    }
    let changed = response.changed();
    changed | apply_slider_arrow_acceleration(ui, &response, value, &range)
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, is_loading: bool) {
        ui.heading("Graph Controls");
        ui.separator();

        ui.label("Analysis document (JSON)");
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.document_path);
            let can_load = !self.document_path.trim().is_empty();
            if ui
                .add_enabled(can_load, egui::Button::new("Load"))
                .on_hover_text("Read a saved analysis result from disk.")
                .clicked()
            {
                self.pending_load = Some(DocumentSource::File(PathBuf::from(
                    self.document_path.trim(),
                )));
            }
        });

        ui.collapsing("Scan repository", |ui| {
            ui.label("Repository root");
            ui.text_edit_singleline(&mut self.scan.repo_root);
            ui.label("Backend endpoint");
            ui.text_edit_singleline(&mut self.scan.endpoint);
            ui.checkbox(&mut self.scan.include_tests, "Include tests");
            ui.add(egui::Slider::new(&mut self.scan.max_depth, 1..=50).text("Max depth"));

            let can_scan = !self.scan.repo_root.trim().is_empty();
            let label = if is_loading { "Scanning..." } else { "Scan" };
            if ui
                .add_enabled(can_scan, egui::Button::new(label))
                .on_hover_text("Ask the analysis backend to scan the repository.")
                .clicked()
            {
                let mut request = self.scan.clone();
                request.repo_root = request.repo_root.trim().to_owned();
                self.pending_load = Some(DocumentSource::Scan(request));
            }
        });

        ui.separator();

        ui.horizontal_wrapped(|ui| {
            if ui.button("Expand all").clicked() {
                self.controller.expand_all();
            }
            if ui.button("Collapse all").clicked() {
                self.controller.collapse_all();
            }
            if ui
                .button("Reset")
                .on_hover_text("Clear the loaded analysis and start over.")
                .clicked()
            {
                self.controller.reset();
                self.selected = None;
                self.load_error = None;
            }
        });

        ui.separator();

        ui.label("Search nodes");
        let search_response = ui.text_edit_singleline(&mut self.search);
        if search_response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
            self.focus_requested = true;
        }
        search_response.on_hover_text("Fuzzy-highlight matching nodes; press Enter to focus the best one.");

        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Advance the layout every frame until it settles.");

        let mut changed = false;
        let params = self.controller.params_mut();
        changed |= ui
            .checkbox(&mut params.clustering, "Cluster handlers and models")
            .on_hover_text("Pull handler and model declarations toward their own regions.")
            .changed();

        ui.collapsing("Forces", |ui| {
            changed |= force_slider(
                ui,
                &mut params.link_distance,
                20.0..=400.0,
                "Link distance",
                "Target length of an edge before its length factor.",
            );
            changed |= force_slider(
                ui,
                &mut params.link_strength,
                0.0..=1.5,
                "Link strength",
                "Default spring stiffness for edges without an override.",
            );
            changed |= force_slider(
                ui,
                &mut params.repulsion,
                0.0..=40_000.0,
                "Repulsion",
                "How strongly nodes push each other away.",
            );
            changed |= force_slider(
                ui,
                &mut params.collision_radius,
                0.2..=3.0,
                "Collision radius",
                "Scale applied to every node's collision disc.",
            );
            changed |= force_slider(
                ui,
                &mut params.cluster_strength,
                0.0..=0.3,
                "Cluster strength",
                "Pull of clustered kinds toward their attractor points.",
            );
            changed |= force_slider(
                ui,
                &mut params.radial_strength,
                0.0..=0.5,
                "Radial strength",
                "Pull of modules toward their slot on the ring around the root.",
            );
            changed |= force_slider(
                ui,
                &mut params.center_strength,
                0.0..=0.3,
                "Center strength",
                "How quickly the layout drifts back to the middle.",
            );
        });

        if changed {
            self.controller.nudge();
        }
    }
}
