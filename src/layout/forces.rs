use std::f32::consts::TAU;

use emath::{Vec2, vec2};

use super::quadtree::QuadNode;
use super::{SimEdge, SimNode};

pub(super) const BARNES_HUT_THETA: f32 = 0.72;

/// Dot product of relative velocity along the spring axis, scaled by this,
/// bleeds oscillation energy out of stretched links.
const SPRING_DAMPING: f32 = 0.22;

/// Nodes closer than (r1 + r2) * spacing receive a separation push.
const COLLISION_SPACING: f32 = 1.35;

pub(super) fn repulsion_between(point: Vec2, other: Vec2, strength: f32, softening: f32) -> Vec2 {
    let delta = point - other;
    let distance_sq = delta.length_sq();
    let direction = if distance_sq > 0.0001 {
        delta / distance_sq.sqrt()
    } else {
        vec2(1.0, 0.0)
    };

    direction * (strength / (distance_sq + softening))
}

/// Barnes-Hut traversal for one node. Far cells are approximated by their
/// center of mass, near cells are descended into, leaves are summed exactly.
pub(super) fn accumulate_repulsion(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    softening: f32,
    theta: f32,
    force: &mut Vec2,
) {
    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            *force += repulsion_between(point, positions[other], strength, softening);
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(0.0001);
    let side = node.bounds.side_length();
    let can_approximate =
        !node.bounds.contains(point) && side * side < theta * theta * distance_sq && node.mass > 1.0;

    if can_approximate {
        *force += repulsion_between(point, node.center_of_mass, strength * node.mass, softening);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion(child, index, positions, strength, softening, theta, force);
    }
}

pub(super) fn accumulate_springs(
    nodes: &[SimNode],
    edges: &[SimEdge],
    spring_strength: f32,
    forces: &mut [Vec2],
) {
    for edge in edges {
        if edge.from >= nodes.len() || edge.to >= nodes.len() {
            continue;
        }

        let delta = nodes[edge.from].pos - nodes[edge.to].pos;
        let distance_sq = delta.length_sq();
        if distance_sq <= 0.000001 {
            continue;
        }

        let distance = distance_sq.sqrt();
        let direction = delta / distance;

        let stretch = (distance - edge.rest_length) * spring_strength * edge.strength;
        let relative_velocity = nodes[edge.from].velocity - nodes[edge.to].velocity;
        let damping = relative_velocity.dot(direction) * SPRING_DAMPING;
        let correction = direction * (stretch + damping);

        forces[edge.from] -= correction;
        forces[edge.to] += correction;
    }
}

pub(super) fn accumulate_collisions(
    positions: &[Vec2],
    radii: &[f32],
    collision_strength: f32,
    forces: &mut [Vec2],
) {
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let delta = positions[i] - positions[j];
            let distance_sq = delta.length_sq();
            let min_distance = (radii[i] + radii[j]) * COLLISION_SPACING;
            if distance_sq >= min_distance * min_distance {
                continue;
            }

            let distance = distance_sq.sqrt();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * TAU;
                vec2(angle.cos(), angle.sin())
            };

            let push = direction * ((min_distance - distance) * collision_strength);
            forces[i] += push;
            forces[j] -= push;
        }
    }
}

/// Weak pull toward the origin keeps disconnected clusters on screen. The
/// local node gets an extra pull so the mesh arranges itself around it.
pub(super) fn accumulate_centering(
    nodes: &[SimNode],
    center_pull: f32,
    local_pull: f32,
    forces: &mut [Vec2],
) {
    for (index, node) in nodes.iter().enumerate() {
        if node.pinned {
            continue;
        }
        let mut pull = center_pull;
        if node.band.is_local() {
            pull += local_pull;
        }
        forces[index] -= node.pos * pull;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::HopBand;

    fn sim_node(id: &str, pos: Vec2, band: HopBand) -> SimNode {
        SimNode {
            id: id.to_owned(),
            pos,
            velocity: Vec2::ZERO,
            band,
            radius: 14.0,
            pinned: false,
        }
    }

    #[test]
    fn repulsion_points_away_from_the_other_node() {
        let force = repulsion_between(vec2(10.0, 0.0), vec2(0.0, 0.0), 1000.0, 1.0);
        assert!(force.x > 0.0);
        assert_eq!(force.y, 0.0);
    }

    #[test]
    fn repulsion_falls_off_with_distance() {
        let near = repulsion_between(vec2(10.0, 0.0), Vec2::ZERO, 1000.0, 1.0);
        let far = repulsion_between(vec2(100.0, 0.0), Vec2::ZERO, 1000.0, 1.0);
        assert!(near.length_sq() > far.length_sq());
    }

    #[test]
    fn coincident_repulsion_still_separates() {
        let force = repulsion_between(Vec2::ZERO, Vec2::ZERO, 1000.0, 1.0);
        assert!(force.length_sq() > 0.0);
    }

    #[test]
    fn stretched_spring_pulls_endpoints_together() {
        let nodes = vec![
            sim_node("a", Vec2::ZERO, HopBand::Direct),
            sim_node("b", vec2(300.0, 0.0), HopBand::Direct),
        ];
        let edges = vec![SimEdge {
            from: 0,
            to: 1,
            hops: 0,
            rest_length: 90.0,
            strength: 1.0,
        }];
        let mut forces = vec![Vec2::ZERO; 2];

        accumulate_springs(&nodes, &edges, 0.02, &mut forces);

        assert!(forces[0].x > 0.0);
        assert!(forces[1].x < 0.0);
    }

    #[test]
    fn compressed_spring_pushes_endpoints_apart() {
        let nodes = vec![
            sim_node("a", Vec2::ZERO, HopBand::Direct),
            sim_node("b", vec2(20.0, 0.0), HopBand::Direct),
        ];
        let edges = vec![SimEdge {
            from: 0,
            to: 1,
            hops: 0,
            rest_length: 90.0,
            strength: 1.0,
        }];
        let mut forces = vec![Vec2::ZERO; 2];

        accumulate_springs(&nodes, &edges, 0.02, &mut forces);

        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
    }

    #[test]
    fn overlapping_nodes_are_pushed_apart() {
        let positions = vec![Vec2::ZERO, vec2(5.0, 0.0)];
        let radii = vec![14.0, 14.0];
        let mut forces = vec![Vec2::ZERO; 2];

        accumulate_collisions(&positions, &radii, 1.0, &mut forces);

        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
    }

    #[test]
    fn distant_nodes_receive_no_collision_push() {
        let positions = vec![Vec2::ZERO, vec2(500.0, 0.0)];
        let radii = vec![14.0, 14.0];
        let mut forces = vec![Vec2::ZERO; 2];

        accumulate_collisions(&positions, &radii, 1.0, &mut forces);

        assert_eq!(forces[0], Vec2::ZERO);
        assert_eq!(forces[1], Vec2::ZERO);
    }

    #[test]
    fn centering_skips_pinned_and_favors_the_local_node() {
        let mut local = sim_node("self", vec2(100.0, 0.0), HopBand::Local);
        let remote = sim_node("a", vec2(100.0, 0.0), HopBand::Direct);
        let mut pinned = sim_node("b", vec2(100.0, 0.0), HopBand::Direct);
        pinned.pinned = true;
        local.radius = 22.0;

        let nodes = vec![local, remote, pinned];
        let mut forces = vec![Vec2::ZERO; 3];

        accumulate_centering(&nodes, 0.0011, 0.03, &mut forces);

        assert!(forces[0].x < forces[1].x && forces[1].x < 0.0);
        assert_eq!(forces[2], Vec2::ZERO);
    }

    #[test]
    fn barnes_hut_matches_direct_sum_for_far_clusters() {
        let mut positions = vec![vec2(-400.0, 0.0)];
        for index in 0..12 {
            positions.push(vec2(400.0 + (index % 4) as f32, (index / 4) as f32));
        }
        let tree = QuadNode::build(&positions).unwrap();

        let mut approximate = Vec2::ZERO;
        accumulate_repulsion(&tree, 0, &positions, 50_000.0, 540.0, BARNES_HUT_THETA, &mut approximate);

        let mut exact = Vec2::ZERO;
        for other in 1..positions.len() {
            exact += repulsion_between(positions[0], positions[other], 50_000.0, 540.0);
        }

        let error = (approximate - exact).length() / exact.length().max(0.0001);
        assert!(error < 0.05, "approximation error too large: {error}");
        assert!(approximate.x < 0.0);
    }
}
