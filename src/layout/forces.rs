use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;
use super::{Body, Link};

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct LinkParams {
    pub(super) distance: f32,
    pub(super) strength: f32,
    pub(super) clustered_scale: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) radius_scale: f32,
    pub(super) max_distance_sq: f32,
}

/// Unit vector from `b` to `a`, or a golden-angle direction derived from the
/// pair when the two points coincide.
fn separation_direction(delta: Vec2, a: usize, b: usize) -> Vec2 {
    let distance = delta.length();
    if distance > 0.0001 {
        return delta / distance;
    }

    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin())
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    charges: &[f32],
    params: RepulsionParams,
    force: &mut Vec2,
) {
    if node.charge <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            let delta = point - positions[other];
            let magnitude =
                params.strength * charges[other] / (delta.length_sq() + params.softening);
            *force += separation_direction(delta, index, other) * magnitude;
        }
        return;
    }

    let delta = point - node.center_of_charge;
    let distance_sq = delta.length_sq().max(0.0001);
    let can_approximate = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance_sq.sqrt()) < params.theta
        && node.count > 1;

    if can_approximate {
        let magnitude = params.strength * node.charge / (distance_sq + params.softening);
        *force += delta.normalized() * magnitude;
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, charges, params, force);
    }
}

fn push_apart(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let min_distance = (radii[from] + radii[to]) * params.radius_scale;
    if distance >= min_distance {
        return;
    }

    let push = separation_direction(delta, from, to) * (min_distance - distance) * params.strength * 0.5;
    forces[from] += push;
    forces[to] -= push;
}

pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    push_apart(from, to, positions, radii, params, forces);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    push_apart(from, to, positions, radii, params, forces);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_deref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, forces);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_deref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, forces,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, forces);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, forces);
        }
    }
}

/// Spring toward `link_distance * length_factor`, split between endpoints
/// by degree so hubs move less than leaves.
pub(super) fn accumulate_links(
    links: &[Link],
    bodies: &[Body],
    degrees: &[usize],
    params: LinkParams,
    alpha: f32,
    forces: &mut [Vec2],
) {
    for link in links {
        let source = &bodies[link.source];
        let target = &bodies[link.target];
        let delta = (target.position + target.velocity) - (source.position + source.velocity);
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }

        let strength = link.strength_override.unwrap_or(if link.clustered_target {
            params.strength * params.clustered_scale
        } else {
            params.strength
        });
        let desired = params.distance * link.length_factor;
        let correction = delta * ((distance - desired) / distance) * alpha * strength;

        let source_degree = degrees[link.source] as f32;
        let target_degree = degrees[link.target] as f32;
        let bias = source_degree / (source_degree + target_degree);

        forces[link.target] -= correction * bias;
        forces[link.source] += correction * (1.0 - bias);
    }
}

/// Pull toward a fixed point, proportional to the remaining offset.
pub(super) fn attraction(position: Vec2, target: Vec2, strength: f32, alpha: f32) -> Vec2 {
    (target - position) * strength * alpha
}

/// Evenly spaced slot `slot` of `count` on a circle around `origin`.
pub(super) fn radial_slot(origin: Vec2, radius: f32, slot: usize, count: usize) -> Vec2 {
    let angle = TAU * slot as f32 / count.max(1) as f32;
    origin + vec2(angle.cos(), angle.sin()) * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radial_slots_are_evenly_spaced() {
        let origin = vec2(10.0, -5.0);
        let first = radial_slot(origin, 100.0, 0, 4);
        let second = radial_slot(origin, 100.0, 1, 4);
        assert!((first - vec2(110.0, -5.0)).length() < 1e-3);
        assert!((second - vec2(10.0, 95.0)).length() < 1e-3);
    }

    #[test]
    fn coincident_points_still_separate() {
        let direction = separation_direction(Vec2::ZERO, 3, 7);
        assert!((direction.length() - 1.0).abs() < 1e-4);
        assert!(direction.x.is_finite() && direction.y.is_finite());
    }

    #[test]
    fn attraction_vanishes_at_target() {
        let target = vec2(5.0, 5.0);
        assert_eq!(attraction(target, target, 0.4, 1.0), Vec2::ZERO);
        let pull = attraction(Vec2::ZERO, target, 0.5, 0.5);
        assert_eq!(pull, vec2(1.25, 1.25));
    }
}
