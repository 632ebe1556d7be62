mod frame;
mod highlight;
mod search;

use std::iter;
use std::time::Instant;

use eframe::egui::Vec2;

use crate::document::{LoadError, SourceDocument};
use crate::graph::{
    ExpansionSet, FlatGraph, ROOT_ID, Toggle, build, distances_from, expandable_ids,
};
use crate::layout::{ForceParams, PositionCache, SimulationState};
pub use frame::{EdgeSprite, NodeSprite, RenderFrame};
use highlight::EDGE_COLOR;
pub use highlight::{HoverState, MAX_HIGHLIGHT_DISTANCE};
pub use search::{SearchHit, search_nodes};

/// Owns the document, expansion set, flat graph and simulation, and turns
/// pointer and control events into state transitions. Every transition that
/// changes the expansion set or document rebuilds the flat graph from the
/// latest inputs and re-seeds the simulation from the position cache.
pub struct GraphController {
    document: SourceDocument,
    expansion: ExpansionSet,
    graph: FlatGraph,
    simulation: SimulationState,
    cache: PositionCache,
    params: ForceParams,
    hover: Option<HoverState>,
    dragging: Option<String>,
    revision: u64,
}

impl GraphController {
    pub fn new(params: ForceParams) -> Self {
        let document = SourceDocument::default();
        let expansion = ExpansionSet::root_only();
        let graph = build(&document, &expansion);
        let cache = PositionCache::default();
        let simulation = SimulationState::initialize(&graph, &cache, &params);

        Self {
            document,
            expansion,
            graph,
            simulation,
            cache,
            params,
            hover: None,
            dragging: None,
            revision: 0,
        }
    }

    /// Replaces the document and resets expansion to the root. Cached
    /// positions are kept for ids that reappear.
    pub fn load_document(&mut self, document: SourceDocument) {
        tracing::info!(modules = document.module_count(), "document loaded");
        self.document = document;
        self.expansion = ExpansionSet::root_only();
        self.rebuild();
    }

    /// Applies a finished load. A failure leaves the current graph untouched
    /// and is handed back to the caller for reporting.
    pub fn apply_load(&mut self, result: Result<SourceDocument, LoadError>) -> Result<(), LoadError> {
        match result {
            Ok(document) => {
                self.load_document(document);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(error = %error, "document load failed; keeping current graph");
                Err(error)
            }
        }
    }

    pub fn reset(&mut self) {
        tracing::info!("graph reset");
        self.document = SourceDocument::default();
        self.expansion = ExpansionSet::root_only();
        self.rebuild();
    }

    pub fn toggle_expansion(&mut self, id: &str) -> Toggle {
        let toggle = self.expansion.toggle(id, &self.graph);
        match toggle {
            Toggle::Ignored => tracing::debug!(id, "toggle ignored"),
            Toggle::Expanded | Toggle::Collapsed(_) => {
                tracing::debug!(id, ?toggle, "expansion toggled");
                self.rebuild();
            }
        }
        toggle
    }

    pub fn expand_all(&mut self) {
        self.expansion = ExpansionSet::from_ids(
            iter::once(ROOT_ID.to_owned()).chain(expandable_ids(&self.document)),
        );
        self.rebuild();
    }

    pub fn collapse_all(&mut self) {
        self.expansion = ExpansionSet::root_only();
        self.rebuild();
    }

    /// Hover enter with `Some(id)`, hover exit with `None`. Unknown ids are
    /// ignored.
    pub fn hover(&mut self, id: Option<&str>) {
        match id {
            None => self.hover = None,
            Some(id) if self.hover.as_ref().is_some_and(|hover| hover.id == id) => {}
            Some(id) if self.graph.contains(id) => {
                self.hover = Some(HoverState {
                    id: id.to_owned(),
                    distances: distances_from(id, &self.graph.nodes, &self.graph.edges),
                });
            }
            Some(id) => tracing::trace!(id, "hover on unknown node ignored"),
        }
    }

    /// Pins `id` where it currently is and reheats the simulation.
    pub fn drag_start(&mut self, id: &str) -> bool {
        let Some(position) = self.simulation.position(id) else {
            tracing::trace!(id, "drag on unknown node ignored");
            return false;
        };

        if let Some(previous) = self.dragging.take() {
            self.simulation.unpin(&previous);
        }
        self.simulation.pin(id, position);
        self.simulation.reheat(self.params.drag_alpha_target);
        self.dragging = Some(id.to_owned());
        true
    }

    pub fn drag_move(&mut self, pointer: Vec2) {
        if let Some(id) = &self.dragging {
            self.simulation.pin(id, pointer);
        }
    }

    pub fn drag_end(&mut self) {
        let Some(id) = self.dragging.take() else {
            return;
        };
        self.simulation.unpin(&id);
        self.simulation.cool();
    }

    /// Advances the simulation by one tick unless it is at rest. Returns
    /// whether a step ran.
    pub fn tick(&mut self) -> bool {
        if self.dragging.is_none() && self.simulation.is_settled(&self.params) {
            return false;
        }

        self.simulation.step(&self.params);
        if self.dragging.is_none() && self.simulation.is_settled(&self.params) {
            tracing::debug!(
                ticks = self.simulation.ticks(),
                energy = self.simulation.kinetic_energy(),
                "simulation settled"
            );
        }
        true
    }

    /// Wakes a settled simulation after a parameter change.
    pub fn nudge(&mut self) {
        self.simulation.reheat(self.params.drag_alpha_target);
        self.simulation.cool();
    }

    pub fn frame(&self) -> RenderFrame {
        let hover = self.hover.as_ref();
        let nodes = self
            .simulation
            .bodies()
            .iter()
            .zip(&self.graph.nodes)
            .map(|(body, node)| NodeSprite {
                id: node.id.clone(),
                position: body.position,
                kind: node.kind,
                display_name: node.display_name.clone(),
                has_expandable_children: node.has_expandable_children,
                expanded: self.expansion.contains(&node.id),
                pinned: body.is_pinned(),
                opacity: hover.map_or(1.0, |hover| hover.node_opacity(&node.id)),
            })
            .collect();

        let edges = self
            .graph
            .edges
            .iter()
            .filter_map(|edge| {
                let from = self.simulation.position(&edge.source_id)?;
                let to = self.simulation.position(&edge.target_id)?;
                Some(EdgeSprite {
                    source_id: edge.source_id.clone(),
                    target_id: edge.target_id.clone(),
                    from,
                    to,
                    kind: edge.kind,
                    color: hover.map_or(EDGE_COLOR, |hover| {
                        hover.edge_color(&edge.source_id, &edge.target_id)
                    }),
                    opacity: hover.map_or(1.0, |hover| {
                        hover.edge_opacity(&edge.source_id, &edge.target_id)
                    }),
                })
            })
            .collect();

        RenderFrame { nodes, edges }
    }

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        search_nodes(&self.graph, query)
    }

    fn rebuild(&mut self) {
        let started = Instant::now();
        let drag_pin = self
            .dragging
            .as_deref()
            .and_then(|id| self.simulation.body(id))
            .and_then(|body| body.pin);

        self.cache.record(&self.simulation);
        self.graph = build(&self.document, &self.expansion);
        self.simulation = SimulationState::initialize(&self.graph, &self.cache, &self.params);

        if let (Some(id), Some(pin)) = (self.dragging.clone(), drag_pin) {
            if self.simulation.pin(&id, pin) {
                self.simulation.reheat(self.params.drag_alpha_target);
            } else {
                self.dragging = None;
            }
        }

        if let Some(hovered) = self.hover.take() {
            self.hover(Some(&hovered.id));
        }

        self.revision += 1;
        tracing::debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            expanded = self.expansion.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "graph rebuilt"
        );
    }

    pub fn graph(&self) -> &FlatGraph {
        &self.graph
    }

    pub fn document(&self) -> &SourceDocument {
        &self.document
    }

    pub fn expansion(&self) -> &ExpansionSet {
        &self.expansion
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.simulation
    }

    pub fn position_cache(&self) -> &PositionCache {
        &self.cache
    }

    pub fn params(&self) -> &ForceParams {
        &self.params
    }

    /// Changes apply on the next tick; no rebuild is needed.
    pub fn params_mut(&mut self) -> &mut ForceParams {
        &mut self.params
    }

    pub fn hovered(&self) -> Option<&HoverState> {
        self.hover.as_ref()
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    pub fn is_settled(&self) -> bool {
        self.dragging.is_none() && self.simulation.is_settled(&self.params)
    }

    /// Bumped on every rebuild so callers can invalidate per-graph caches.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use eframe::egui::vec2;
    use pretty_assertions::assert_eq;

    use super::highlight::{HIGHLIGHT_COLOR, opacity_for};
    use super::*;
    use crate::graph::scenario_document;

    fn controller() -> GraphController {
        let mut controller = GraphController::new(ForceParams::default());
        controller.load_document(scenario_document());
        controller
    }

    fn node_ids(controller: &GraphController) -> BTreeSet<String> {
        controller
            .graph()
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .collect()
    }

    fn edge_pairs(controller: &GraphController) -> BTreeSet<(String, String)> {
        controller
            .graph()
            .edges
            .iter()
            .map(|edge| (edge.source_id.clone(), edge.target_id.clone()))
            .collect()
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    fn pairs(values: &[(&str, &str)]) -> BTreeSet<(String, String)> {
        values
            .iter()
            .map(|(source, target)| ((*source).to_owned(), (*target).to_owned()))
            .collect()
    }

    #[test]
    fn toggle_sequence_expands_and_collapses_descendants() {
        let mut controller = controller();
        assert_eq!(node_ids(&controller), ids(&["root", "module"]));
        assert_eq!(edge_pairs(&controller), pairs(&[("root", "module")]));

        assert_eq!(controller.toggle_expansion("module"), Toggle::Expanded);
        assert_eq!(
            node_ids(&controller),
            ids(&["root", "module", "module.declA", "module.declB"])
        );

        assert_eq!(controller.toggle_expansion("module.declA"), Toggle::Expanded);
        assert_eq!(
            edge_pairs(&controller),
            pairs(&[
                ("root", "module"),
                ("module", "module.declA"),
                ("module", "module.declB"),
                ("module.declA", "module.declA.callX"),
            ])
        );

        assert_eq!(controller.toggle_expansion("module"), Toggle::Collapsed(2));
        assert_eq!(node_ids(&controller), ids(&["root", "module"]));
        assert!(!controller.expansion().contains("module"));
        assert!(!controller.expansion().contains("module.declA"));
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut controller = controller();
        let revision = controller.revision();

        assert_eq!(controller.toggle_expansion("nope"), Toggle::Ignored);
        controller.hover(Some("nope"));
        assert!(!controller.drag_start("nope"));
        controller.drag_move(vec2(10.0, 10.0));
        controller.drag_end();

        assert_eq!(controller.revision(), revision);
        assert!(controller.hovered().is_none());
        assert!(controller.dragging().is_none());
    }

    #[test]
    fn hover_fades_by_distance_and_exit_restores() {
        let mut controller = controller();
        controller.toggle_expansion("module");
        controller.toggle_expansion("module.declA");

        controller.hover(Some("module.declA"));
        let frame = controller.frame();
        assert_eq!(frame.node("module.declA").unwrap().opacity, 1.0);
        assert_eq!(frame.node("module").unwrap().opacity, opacity_for(Some(1)));
        assert_eq!(frame.node("module.declA.callX").unwrap().opacity, opacity_for(Some(1)));
        assert_eq!(frame.node("module.declB").unwrap().opacity, opacity_for(Some(2)));
        assert_eq!(frame.node("root").unwrap().opacity, opacity_for(Some(2)));
        assert_eq!(
            frame.edge("module", "module.declA").unwrap().color,
            HIGHLIGHT_COLOR
        );
        assert_eq!(frame.edge("root", "module").unwrap().color, EDGE_COLOR);

        controller.hover(None);
        let frame = controller.frame();
        assert!(frame.nodes.iter().all(|node| node.opacity == 1.0));
        assert!(frame.edges.iter().all(|edge| edge.opacity == 1.0 && edge.color == EDGE_COLOR));
    }

    #[test]
    fn rebuild_reseeds_surviving_nodes_at_cached_positions() {
        let mut controller = controller();
        for _ in 0..40 {
            controller.tick();
        }
        let root = controller.simulation().position("root").unwrap();
        let module = controller.simulation().position("module").unwrap();

        controller.toggle_expansion("module");

        let simulation = controller.simulation();
        assert_eq!(simulation.position("root"), Some(root));
        assert_eq!(simulation.position("module"), Some(module));
        assert_eq!(simulation.body("module").unwrap().velocity, Vec2::ZERO);
        assert_eq!(controller.position_cache().get("module"), Some(module));
    }

    #[test]
    fn drag_pins_then_releases() {
        let mut controller = controller();
        assert!(controller.drag_start("module"));
        assert!(controller.simulation().body("module").unwrap().is_pinned());

        let pointer = vec2(250.0, -90.0);
        controller.drag_move(pointer);
        for _ in 0..10 {
            assert!(controller.tick());
        }
        assert_eq!(controller.simulation().position("module"), Some(pointer));
        assert!(!controller.is_settled());

        controller.drag_end();
        let body = controller.simulation().body("module").unwrap();
        assert!(!body.is_pinned());
        assert_eq!(body.position, pointer);
    }

    #[test]
    fn drag_survives_a_rebuild_when_its_node_does() {
        let mut controller = controller();
        controller.drag_start("module");
        controller.drag_move(vec2(40.0, 40.0));
        controller.toggle_expansion("module");
        assert_eq!(controller.dragging(), Some("module"));
        assert_eq!(controller.simulation().position("module"), Some(vec2(40.0, 40.0)));

        controller.drag_end();
        controller.drag_start("module.declB");
        controller.collapse_all();
        assert!(controller.dragging().is_none());
    }

    #[test]
    fn hover_is_recomputed_or_cleared_on_rebuild() {
        let mut controller = controller();
        controller.toggle_expansion("module");
        controller.hover(Some("module.declB"));
        assert_eq!(controller.hovered().unwrap().distances["root"], 2);

        controller.toggle_expansion("module.declA");
        assert!(
            controller
                .hovered()
                .unwrap()
                .distances
                .contains_key("module.declA.callX")
        );

        controller.collapse_all();
        assert!(controller.hovered().is_none());
    }

    #[test]
    fn expand_all_then_collapse_all() {
        let mut controller = controller();
        controller.expand_all();
        assert_eq!(
            node_ids(&controller),
            ids(&[
                "root",
                "module",
                "module.declA",
                "module.declB",
                "module.declA.callX"
            ])
        );

        controller.collapse_all();
        assert_eq!(node_ids(&controller), ids(&["root", "module"]));
        assert_eq!(controller.expansion(), &ExpansionSet::root_only());
    }

    #[test]
    fn failed_load_keeps_current_graph() {
        let mut controller = controller();
        controller.toggle_expansion("module");
        let before = node_ids(&controller);

        let result = controller.apply_load(Err(LoadError::Shape("no modules".to_owned())));
        assert!(result.is_err());
        assert_eq!(node_ids(&controller), before);
        assert!(controller.expansion().contains("module"));
    }

    #[test]
    fn new_document_resets_expansion_but_keeps_positions() {
        let mut controller = controller();
        controller.toggle_expansion("module");
        for _ in 0..10 {
            controller.tick();
        }
        let module = controller.simulation().position("module").unwrap();

        controller.apply_load(Ok(scenario_document())).unwrap();
        assert_eq!(controller.expansion(), &ExpansionSet::root_only());
        assert_eq!(controller.simulation().position("module"), Some(module));

        controller.reset();
        assert_eq!(node_ids(&controller), ids(&["root"]));
    }

    #[test]
    fn parameter_changes_apply_without_rebuild() {
        let mut short = controller();
        let mut long = controller();
        let revision = long.revision();
        assert_eq!(
            short.simulation().position("module"),
            long.simulation().position("module")
        );

        for controller in [&mut short, &mut long] {
            controller.params_mut().max_speed = 10_000.0;
        }
        short.params_mut().link_distance = 60.0;
        long.params_mut().link_distance = 600.0;
        assert!(short.tick());
        assert!(long.tick());

        assert_eq!(long.revision(), revision);
        let spread = |controller: &GraphController| {
            let simulation = controller.simulation();
            (simulation.position("module").unwrap() - simulation.position("root").unwrap()).length()
        };
        assert!(spread(&long) > spread(&short));
    }
}
