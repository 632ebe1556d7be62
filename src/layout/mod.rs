mod forces;
mod params;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::graph::{FlatGraph, NodeKind};
use crate::util::stable_pair;
use forces::{
    CollisionParams, LinkParams, RepulsionParams, accumulate_collision_pairs, accumulate_links,
    accumulate_repulsion_for_node, attraction, radial_slot,
};
pub use params::ForceParams;
use quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.72;
const ALPHA_MIN: f32 = 0.001;

/// One simulated node. `pin` overrides integration while set.
#[derive(Clone, Debug)]
pub struct Body {
    pub id: String,
    pub kind: NodeKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pin: Option<Vec2>,
}

impl Body {
    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }
}

#[derive(Clone, Copy, Debug)]
struct Link {
    source: usize,
    target: usize,
    length_factor: f32,
    strength_override: Option<f32>,
    clustered_target: bool,
}

#[derive(Default)]
struct Scratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    charges: Vec<f32>,
    radii: Vec<f32>,
}

/// Last known coordinate per node id. Outlives every simulation and is never
/// pruned, so ids that disappear and come back are re-seeded where they were.
#[derive(Clone, Debug, Default)]
pub struct PositionCache {
    positions: HashMap<String, Vec2>,
}

impl PositionCache {
    pub fn record(&mut self, state: &SimulationState) {
        for body in &state.bodies {
            if body.position.is_finite() {
                self.positions.insert(body.id.clone(), body.position);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Vec2> {
        self.positions.get(id).copied()
    }

    pub fn insert(&mut self, id: impl Into<String>, position: Vec2) {
        self.positions.insert(id.into(), position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Positions, velocities and temperature of one flat graph version.
///
/// Owned by a single caller; [`SimulationState::step`] advances it in place
/// and reads the force configuration fresh on every call.
pub struct SimulationState {
    bodies: Vec<Body>,
    links: Vec<Link>,
    degrees: Vec<usize>,
    index_by_id: HashMap<String, usize>,
    root_index: Option<usize>,
    module_slots: Vec<usize>,
    alpha: f32,
    alpha_target: f32,
    ticks: u32,
    kinetic_energy: f32,
    scratch: Scratch,
}

impl SimulationState {
    /// Seeds a simulation for `graph`. Nodes with a cached coordinate start
    /// there at rest; the rest spawn around the centroid of the seeded ones.
    pub fn initialize(graph: &FlatGraph, cache: &PositionCache, params: &ForceParams) -> Self {
        let seeded = graph
            .nodes
            .iter()
            .filter_map(|node| cache.get(&node.id))
            .collect::<Vec<_>>();
        let spawn_center = if seeded.is_empty() {
            params.center
        } else {
            seeded.iter().fold(Vec2::ZERO, |sum, point| sum + *point) / seeded.len() as f32
        };

        let bodies = graph
            .nodes
            .iter()
            .map(|node| {
                let position = cache.get(&node.id).unwrap_or_else(|| {
                    let (x, y) = stable_pair(&node.id);
                    spawn_center + vec2(x, y) * params.spawn_jitter
                });
                Body {
                    id: node.id.clone(),
                    kind: node.kind,
                    position,
                    velocity: Vec2::ZERO,
                    pin: None,
                }
            })
            .collect::<Vec<_>>();

        let mut degrees = vec![0usize; bodies.len()];
        let links = graph
            .edges
            .iter()
            .filter_map(|edge| {
                let source = graph.index_of(&edge.source_id)?;
                let target = graph.index_of(&edge.target_id)?;
                degrees[source] += 1;
                degrees[target] += 1;
                Some(Link {
                    source,
                    target,
                    length_factor: edge.length_factor,
                    strength_override: edge.strength_override,
                    clustered_target: bodies[target].kind.is_clustered(),
                })
            })
            .collect::<Vec<_>>();

        let index_by_id = bodies
            .iter()
            .enumerate()
            .map(|(index, body)| (body.id.clone(), index))
            .collect::<HashMap<_, _>>();
        let root_index = bodies.iter().position(|body| body.kind == NodeKind::Root);
        let module_slots = bodies
            .iter()
            .enumerate()
            .filter(|(_, body)| body.kind == NodeKind::Module)
            .map(|(index, _)| index)
            .collect();

        let alpha = if seeded.is_empty() {
            1.0
        } else {
            params.rebuild_alpha
        };

        Self {
            bodies,
            links,
            degrees,
            index_by_id,
            root_index,
            module_slots,
            alpha,
            alpha_target: 0.0,
            ticks: 0,
            kinetic_energy: 0.0,
            scratch: Scratch::default(),
        }
    }

    pub fn step(&mut self, params: &ForceParams) {
        let node_count = self.bodies.len();
        if node_count == 0 {
            return;
        }

        self.alpha += (self.alpha_target - self.alpha) * params.alpha_decay;
        if self.alpha < ALPHA_MIN && self.alpha_target <= 0.0 {
            self.alpha = 0.0;
        }
        let alpha = self.alpha;

        let scratch = &mut self.scratch;
        scratch.forces.clear();
        scratch.forces.resize(node_count, Vec2::ZERO);
        scratch.positions.clear();
        scratch.charges.clear();
        scratch.radii.clear();
        let mut max_radius = 0.0_f32;
        for body in &self.bodies {
            let profile = body.kind.profile();
            scratch.positions.push(body.position);
            scratch.charges.push(profile.charge);
            scratch.radii.push(profile.collision_radius);
            max_radius = max_radius.max(profile.collision_radius);
        }

        let forces = &mut scratch.forces;
        let positions = &scratch.positions;

        if let Some(quadtree) = QuadNode::build(positions, &scratch.charges) {
            let repulsion = RepulsionParams {
                strength: params.repulsion * alpha,
                softening: params.repulsion_softening,
                theta: BARNES_HUT_THETA,
            };
            for (index, force) in forces.iter_mut().enumerate() {
                accumulate_repulsion_for_node(
                    &quadtree,
                    index,
                    positions,
                    &scratch.charges,
                    repulsion,
                    force,
                );
            }

            let reach = max_radius * 2.0 * params.collision_radius;
            if reach > 0.0 && params.collision_strength > 0.0 {
                accumulate_collision_pairs(
                    &quadtree,
                    &quadtree,
                    true,
                    positions,
                    &scratch.radii,
                    CollisionParams {
                        strength: params.collision_strength,
                        radius_scale: params.collision_radius,
                        max_distance_sq: reach * reach,
                    },
                    forces,
                );
            }
        }

        accumulate_links(
            &self.links,
            &self.bodies,
            &self.degrees,
            LinkParams {
                distance: params.link_distance,
                strength: params.link_strength,
                clustered_scale: params.clustered_link_scale,
            },
            alpha,
            forces,
        );

        if params.clustering {
            for (body, force) in self.bodies.iter().zip(forces.iter_mut()) {
                if let Some([x, y]) = body.kind.profile().cluster_anchor {
                    let anchor = params.center + vec2(x, y) * params.cluster_distance;
                    *force += attraction(body.position, anchor, params.cluster_strength, alpha);
                }
            }
        }

        let origin = self
            .root_index
            .map_or(params.center, |index| self.bodies[index].position);
        let slot_count = self.module_slots.len();
        for (slot, &index) in self.module_slots.iter().enumerate() {
            let target = radial_slot(origin, params.radial_radius, slot, slot_count);
            forces[index] += attraction(
                self.bodies[index].position,
                target,
                params.radial_strength,
                alpha,
            );
        }

        let retain = (1.0 - params.velocity_decay).clamp(0.0, 1.0);
        let max_speed_sq = params.max_speed * params.max_speed;
        let mut kinetic_energy = 0.0;
        for (body, force) in self.bodies.iter_mut().zip(forces.iter()) {
            if let Some(pin) = body.pin {
                body.position = pin;
                body.velocity = Vec2::ZERO;
                continue;
            }

            let mut velocity = (body.velocity + *force) * retain;
            if !velocity.is_finite() {
                velocity = Vec2::ZERO;
            }
            let speed_sq = velocity.length_sq();
            if speed_sq > max_speed_sq {
                velocity *= params.max_speed / speed_sq.sqrt();
            }

            body.velocity = velocity;
            body.position += velocity;
            kinetic_energy += velocity.length_sq();
        }

        self.apply_centering(params);
        self.kinetic_energy = kinetic_energy;
        self.ticks = self.ticks.saturating_add(1);
    }

    /// Shifts free bodies so the centroid drifts toward `params.center`.
    fn apply_centering(&mut self, params: &ForceParams) {
        if params.center_strength <= 0.0 {
            return;
        }

        let centroid = self
            .bodies
            .iter()
            .fold(Vec2::ZERO, |sum, body| sum + body.position)
            / self.bodies.len() as f32;
        let shift = (params.center - centroid) * params.center_strength.min(1.0);
        if shift.length_sq() <= 0.000_001 {
            return;
        }

        for body in &mut self.bodies {
            if !body.is_pinned() {
                body.position += shift;
            }
        }
    }

    pub fn is_settled(&self, params: &ForceParams) -> bool {
        if self.ticks >= params.max_ticks {
            return true;
        }
        self.alpha_target <= 0.0 && self.ticks > 0 && self.kinetic_energy < params.energy_threshold
    }

    /// Raises the temperature and holds it at `target` until
    /// [`SimulationState::cool`] is called.
    pub fn reheat(&mut self, target: f32) {
        self.alpha_target = target.max(0.0);
        self.alpha = self.alpha.max(self.alpha_target);
        self.ticks = 0;
        tracing::trace!(alpha = self.alpha, "simulation reheated");
    }

    /// Lets the temperature decay back to rest.
    pub fn cool(&mut self) {
        self.alpha_target = 0.0;
    }

    pub fn pin(&mut self, id: &str, position: Vec2) -> bool {
        let Some(body) = self.body_mut(id) else {
            return false;
        };
        body.pin = Some(position);
        body.position = position;
        body.velocity = Vec2::ZERO;
        true
    }

    /// Releases a pin. The body resumes from the pinned location at rest.
    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(body) = self.body_mut(id) else {
            return false;
        };
        let Some(pin) = body.pin.take() else {
            return false;
        };
        body.position = pin;
        body.velocity = Vec2::ZERO;
        true
    }

    pub fn body(&self, id: &str) -> Option<&Body> {
        self.index_by_id.get(id).map(|&index| &self.bodies[index])
    }

    fn body_mut(&mut self, id: &str) -> Option<&mut Body> {
        self.index_by_id.get(id).map(|&index| &mut self.bodies[index])
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.body(id).map(|body| body.position)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.kinetic_energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::graph::{ExpansionSet, build, scenario_document};

    fn scenario_graph(ids: &[&str]) -> FlatGraph {
        build(&scenario_document(), &ExpansionSet::from_ids(ids.iter().copied()))
    }

    fn run(state: &mut SimulationState, params: &ForceParams, ticks: usize) {
        for _ in 0..ticks {
            state.step(params);
        }
    }

    #[test]
    fn cached_nodes_are_seeded_exactly_at_rest() {
        let params = ForceParams::default();
        let mut cache = PositionCache::default();
        cache.insert("root", vec2(12.0, -8.0));
        cache.insert("module", vec2(300.0, 40.0));

        let graph = scenario_graph(&["root", "module"]);
        let state = SimulationState::initialize(&graph, &cache, &params);

        let module = state.body("module").unwrap();
        assert_eq!(module.position, vec2(300.0, 40.0));
        assert_eq!(module.velocity, Vec2::ZERO);
        assert_eq!(state.position("root"), Some(vec2(12.0, -8.0)));

        let centroid = vec2(156.0, 16.0);
        let fresh = state.body("module.declA").unwrap();
        assert!((fresh.position - centroid).length() <= params.spawn_jitter * 1.5);
        assert_eq!(fresh.velocity, Vec2::ZERO);
    }

    #[test]
    fn unseeded_nodes_do_not_overlap() {
        let graph = scenario_graph(&["root", "module", "module.declA"]);
        let state =
            SimulationState::initialize(&graph, &PositionCache::default(), &ForceParams::default());
        let bodies = state.bodies();
        for (index, body) in bodies.iter().enumerate() {
            for other in &bodies[index + 1..] {
                assert_ne!(body.position, other.position);
            }
        }
    }

    #[test]
    fn pinned_body_does_not_move_and_unpin_resumes_from_pin() {
        let params = ForceParams::default();
        let graph = scenario_graph(&["root", "module", "module.declA"]);
        let mut state = SimulationState::initialize(&graph, &PositionCache::default(), &params);

        let anchor = vec2(-120.0, 75.0);
        assert!(state.pin("module", anchor));
        run(&mut state, &params, 25);
        assert_eq!(state.position("module"), Some(anchor));
        assert_eq!(state.body("module").unwrap().velocity, Vec2::ZERO);

        assert!(state.unpin("module"));
        assert_eq!(state.position("module"), Some(anchor));
        assert!(!state.body("module").unwrap().is_pinned());
        assert!(!state.unpin("module"));
        assert!(!state.pin("missing", anchor));
    }

    #[test]
    fn simulation_stays_finite_and_settles() {
        let params = ForceParams::default();
        let graph = scenario_graph(&["root", "module", "module.declA"]);
        let mut state = SimulationState::initialize(&graph, &PositionCache::default(), &params);

        let mut ticks = 0;
        while !state.is_settled(&params) {
            state.step(&params);
            ticks += 1;
            assert!(ticks <= params.max_ticks);
        }
        assert!(state.bodies().iter().all(|body| body.position.is_finite()));
    }

    #[test]
    fn coincident_spawns_are_separated() {
        let params = ForceParams::default();
        let graph = scenario_graph(&["root", "module", "module.declA"]);
        let mut cache = PositionCache::default();
        for node in &graph.nodes {
            cache.insert(node.id.clone(), Vec2::ZERO);
        }
        let mut state = SimulationState::initialize(&graph, &cache, &params);
        run(&mut state, &params, 30);

        let bodies = state.bodies();
        assert!(bodies.iter().all(|body| body.position.is_finite()));
        assert!(
            bodies
                .iter()
                .skip(1)
                .any(|body| (body.position - bodies[0].position).length() > 1.0)
        );
    }

    #[test]
    fn modules_spread_around_the_root() {
        let document = parse_document(
            r#"{"modules": [{"module": "a"}, {"module": "b"}, {"module": "c"}, {"module": "d"}]}"#,
        )
        .unwrap();
        let graph = build(&document, &ExpansionSet::root_only());
        let params = ForceParams::default();
        let mut state = SimulationState::initialize(&graph, &PositionCache::default(), &params);
        run(&mut state, &params, 300);

        let root = state.position("root").unwrap();
        for id in ["a", "b", "c", "d"] {
            let distance = (state.position(id).unwrap() - root).length();
            assert!(distance > params.radial_radius * 0.3, "{id} stayed at {distance}");
        }
    }

    #[test]
    fn clustered_kinds_drift_toward_their_anchor() {
        let document = parse_document(
            r#"{"modules": [{"module": "api", "tree": {"children": [
                {"name": "create", "type": "handler"},
                {"name": "User", "type": "sql_class"}
            ]}}]}"#,
        )
        .unwrap();
        let graph = build(&document, &ExpansionSet::from_ids(["root", "api"]));
        let params = ForceParams::default();
        let mut state = SimulationState::initialize(&graph, &PositionCache::default(), &params);
        run(&mut state, &params, 300);

        let handler = state.position("api.create").unwrap();
        let model = state.position("api.User").unwrap();
        assert!(handler.x < model.x);
    }

    #[test]
    fn reheat_holds_temperature_until_cooled() {
        let params = ForceParams::default();
        let graph = scenario_graph(&["root", "module"]);
        let mut state = SimulationState::initialize(&graph, &PositionCache::default(), &params);
        run(&mut state, &params, 400);
        assert!(state.alpha() < params.drag_alpha_target);

        state.reheat(params.drag_alpha_target);
        run(&mut state, &params, 50);
        assert!(!state.is_settled(&params));
        assert!((state.alpha() - params.drag_alpha_target).abs() < 1e-3);

        state.cool();
        run(&mut state, &params, 50);
        assert!(state.alpha() < params.drag_alpha_target);
    }

    #[test]
    fn cache_records_every_body() {
        let params = ForceParams::default();
        let graph = scenario_graph(&["root", "module"]);
        let state = SimulationState::initialize(&graph, &PositionCache::default(), &params);
        let mut cache = PositionCache::default();
        cache.record(&state);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("module"), state.position("module"));
    }

    /// Global forces off. Per-edge strength overrides still apply.
    fn quiet_params() -> ForceParams {
        ForceParams {
            repulsion: 0.0,
            link_strength: 0.0,
            collision_strength: 0.0,
            center_strength: 0.0,
            clustering: false,
            radial_strength: 0.0,
            ..ForceParams::default()
        }
    }

    fn clustered_graph() -> FlatGraph {
        let document = parse_document(
            r#"{"modules": [{"module": "api", "tree": {"children": [
                {"name": "create", "type": "handler"},
                {"name": "User", "type": "sql_class"}
            ]}}]}"#,
        )
        .unwrap();
        build(&document, &ExpansionSet::from_ids(["root", "api"]))
    }

    #[test]
    fn changed_parameters_apply_on_the_next_step() {
        let graph = scenario_graph(&["root", "module"]);
        let short = ForceParams {
            link_distance: 60.0,
            ..quiet_params()
        };
        let long = ForceParams {
            link_distance: 400.0,
            ..short
        };

        let mut first = SimulationState::initialize(&graph, &PositionCache::default(), &short);
        let mut second = SimulationState::initialize(&graph, &PositionCache::default(), &short);
        first.step(&short);
        second.step(&long);

        let moved_apart = first
            .bodies()
            .iter()
            .zip(second.bodies())
            .any(|(a, b)| (a.position - b.position).length() > 1e-3);
        assert!(moved_apart);

        let spread = |state: &SimulationState| {
            (state.position("module").unwrap() - state.position("root").unwrap()).length()
        };
        assert!(spread(&second) > spread(&first));
    }

    #[test]
    fn clustering_toggle_controls_the_anchor_pull() {
        let graph = clustered_graph();
        let off = quiet_params();
        let on = ForceParams {
            clustering: true,
            ..off
        };
        let anchor_of = |kind: NodeKind| {
            let [x, y] = kind.profile().cluster_anchor.unwrap();
            on.center + vec2(x, y) * on.cluster_distance
        };

        let mut idle = SimulationState::initialize(&graph, &PositionCache::default(), &off);
        let before = idle.bodies().to_vec();
        run(&mut idle, &off, 40);
        for id in ["api.create", "api.User"] {
            let start = before.iter().find(|body| body.id == id).unwrap().position;
            assert_eq!(idle.position(id), Some(start), "{id} moved");
        }

        let mut pulled = SimulationState::initialize(&graph, &PositionCache::default(), &on);
        run(&mut pulled, &on, 40);
        for (id, kind) in [("api.create", NodeKind::Handler), ("api.User", NodeKind::SqlClass)] {
            let anchor = anchor_of(kind);
            let start = before.iter().find(|body| body.id == id).unwrap().position;
            let end = pulled.position(id).unwrap();
            assert!((end - anchor).length() < (start - anchor).length(), "{id} was not pulled");
        }
    }

    #[test]
    fn violent_forces_are_capped_at_max_speed() {
        let params = ForceParams {
            repulsion: 1.0e9,
            repulsion_softening: 0.01,
            link_strength: 50.0,
            collision_strength: 50.0,
            ..ForceParams::default()
        };
        let graph = clustered_graph();
        let mut state = SimulationState::initialize(&graph, &PositionCache::default(), &params);

        for _ in 0..20 {
            state.step(&params);
            for body in state.bodies() {
                assert!(body.position.is_finite(), "{} left the plane", body.id);
                assert!(
                    body.velocity.length() <= params.max_speed * 1.0001,
                    "{} moved at {}",
                    body.id,
                    body.velocity.length()
                );
            }
        }
    }
}
