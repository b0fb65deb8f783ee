//! Raycast hit resolution.
//!
//! Converts a pointer position into a world-space ray, tests it against the
//! bounds of every candidate node and its descendants, and maps the nearest
//! hit back to its logical owner: the closest ancestor carrying a
//! `NodeIdentity`.

use super::camera::{Camera, Ray};
use super::graph::{Aabb, NodeId, NodeIdentity, SceneGraph};
use glam::{Mat4, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    /// Node whose bounds the ray struck.
    pub node: NodeId,
    /// Ancestor (or the node itself) carrying the selectable identity.
    pub owner: NodeId,
    pub identity: NodeIdentity,
    pub distance: f32,
}

/// Resolve the nearest selectable owner under `ndc`.
///
/// Hidden nodes are skipped. Equal distances keep the first node in test
/// order. A nearest hit without an identified ancestor resolves to `None`.
pub fn resolve(
    ndc: Vec2,
    camera: &Camera,
    graph: &SceneGraph,
    candidates: &[NodeId],
) -> Option<PickHit> {
    let ray = camera.ray_from_ndc(ndc);
    let (node, distance) = nearest_hit(&ray, graph, candidates)?;
    let owner = find_owner_with_identity(graph, node)?;
    let identity = graph.node(owner)?.identity.clone()?;
    Some(PickHit {
        node,
        owner,
        identity,
        distance,
    })
}

/// Walk the ownership chain upward from `node` until a node carries an identity.
pub fn find_owner_with_identity(graph: &SceneGraph, node: NodeId) -> Option<NodeId> {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        let entry = graph.node(current)?;
        if entry.identity.is_some() {
            return Some(current);
        }
        cursor = entry.parent;
    }
    None
}

fn nearest_hit(ray: &Ray, graph: &SceneGraph, candidates: &[NodeId]) -> Option<(NodeId, f32)> {
    let mut best: Option<(NodeId, f32)> = None;
    for &candidate in candidates {
        for id in graph.subtree(candidate) {
            if !graph.is_visible_in_world(id) {
                continue;
            }
            let Some(bounds) = graph.node(id).and_then(|node| node.bounds) else {
                continue;
            };
            let Some(distance) = intersect_bounds(ray, graph.world_matrix(id), bounds) else {
                continue;
            };
            if best.map_or(true, |(_, nearest)| distance < nearest) {
                best = Some((id, distance));
            }
        }
    }
    best
}

/// Ray vs. oriented box, returning the world-space distance to the entry point.
fn intersect_bounds(ray: &Ray, world: Mat4, bounds: Aabb) -> Option<f32> {
    if world.determinant().abs() < 1e-12 {
        return None;
    }
    let inverse = world.inverse();
    // The ray parameter is preserved under an affine map, so `t` stays in world units.
    let origin = inverse.transform_point3(ray.origin);
    let direction = inverse.transform_vector3(ray.direction);

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let (o, d) = (origin[axis], direction[axis]);
        let (lo, hi) = (bounds.min[axis], bounds.max[axis]);
        if d.abs() < 1e-9 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (mut t0, mut t1) = ((lo - o) * inv, (hi - o) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    if t_max < 0.0 {
        return None;
    }
    Some(t_min.max(0.0))
}
