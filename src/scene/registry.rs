//! Fragment entity registry.
//!
//! Entities appear one at a time as their models resolve; a failed load is
//! logged and leaves that index permanently absent.

use super::layout::LayoutProfile;
use crate::assets::{AssetError, AssetHandle, AssetKind, AssetLoader, RequestId};
use crate::config::FragmentConfig;
use crate::render::{
    Aabb, Node, NodeId, NodeIdentity, RenderBackend, ResourceKind, SceneGraph, Transform,
};
use glam::Vec3;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const SHARD_HALF_EXTENTS: Vec3 = Vec3::new(2.2, 1.8, 0.2);

/// Resting y/z captured the first time a fragment moves forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OriginalTransform {
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone)]
pub struct FragmentEntity {
    pub index: usize,
    pub category_key: String,
    pub transform: Transform,
    pub is_clickable: bool,
    pub is_hoverable: bool,
    pub visible: bool,
    pub opacity: f32,
    original: Option<OriginalTransform>,
    node: NodeId,
}

impl FragmentEntity {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn original(&self) -> Option<OriginalTransform> {
        self.original
    }

    /// Record the resting transform on first use; later calls return the first capture.
    pub fn capture_original(&mut self) -> OriginalTransform {
        *self.original.get_or_insert(OriginalTransform {
            y: self.transform.position.y,
            z: self.transform.position.z,
        })
    }
}

#[derive(Debug, Clone)]
struct PendingFragment {
    index: usize,
    category_key: String,
}

#[derive(Debug)]
pub struct FragmentRegistry {
    entities: BTreeMap<usize, FragmentEntity>,
    pending: HashMap<RequestId, PendingFragment>,
    failed: BTreeSet<usize>,
    layout: LayoutProfile,
    expected: usize,
    revealed: bool,
    clickable: bool,
}

impl FragmentRegistry {
    pub fn new(layout: LayoutProfile) -> Self {
        Self {
            entities: BTreeMap::new(),
            pending: HashMap::new(),
            failed: BTreeSet::new(),
            layout,
            expected: 0,
            revealed: false,
            clickable: false,
        }
    }

    /// Request every fragment model. Entities are created as completions arrive.
    pub fn load_all(&mut self, configs: &[FragmentConfig], loader: &mut dyn AssetLoader) {
        self.expected = configs.len();
        for (index, config) in configs.iter().enumerate() {
            let request = loader.request(AssetKind::Model, &config.model);
            self.pending.insert(
                request,
                PendingFragment {
                    index,
                    category_key: config.category_key.clone(),
                },
            );
        }
        log::info!("Requested {} fragment model(s)", configs.len());
    }

    pub fn owns_request(&self, request: RequestId) -> bool {
        self.pending.contains_key(&request)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Handle a model completion. Returns the index of the entity created, if any.
    pub fn on_model_loaded(
        &mut self,
        request: RequestId,
        result: Result<AssetHandle, AssetError>,
        graph: &mut SceneGraph,
        renderer: &mut dyn RenderBackend,
    ) -> Option<usize> {
        let pending = self.pending.remove(&request)?;
        let handle = match result {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!(
                    "Fragment {} ({}) failed to load, skipping: {}",
                    pending.index,
                    pending.category_key,
                    err
                );
                self.failed.insert(pending.index);
                return None;
            }
        };

        let geometry = renderer.create_resource(ResourceKind::Geometry, &handle.path);
        let material = renderer.create_resource(ResourceKind::Material, &handle.path);
        let transform = Transform {
            position: self.layout.grid_position(pending.index, self.expected),
            scale: Vec3::splat(self.layout.fragment_scale()),
            ..Transform::default()
        };
        let node = graph.add_node(
            Node::new(format!("fragment-{}", pending.index))
                .with_transform(transform)
                .with_identity(NodeIdentity {
                    index: pending.index,
                    category_key: pending.category_key.clone(),
                }),
        );
        graph.add_child(
            node,
            Node::new(format!("fragment-{}-mesh", pending.index))
                .with_bounds(Aabb::from_half_extents(SHARD_HALF_EXTENTS))
                .with_resources(vec![geometry, material]),
        );

        self.entities.insert(
            pending.index,
            FragmentEntity {
                index: pending.index,
                category_key: pending.category_key,
                transform,
                is_clickable: self.clickable,
                is_hoverable: self.clickable,
                visible: self.revealed,
                opacity: 1.0,
                original: None,
                node,
            },
        );
        log::debug!("Fragment {} ready", pending.index);
        Some(pending.index)
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.revealed = visible;
        for entity in self.entities.values_mut() {
            entity.visible = visible;
        }
    }

    pub fn set_clickable(&mut self, clickable: bool) {
        self.clickable = clickable;
        for entity in self.entities.values_mut() {
            entity.is_clickable = clickable;
            entity.is_hoverable = clickable;
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn get(&self, index: usize) -> Option<&FragmentEntity> {
        self.entities.get(&index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut FragmentEntity> {
        self.entities.get_mut(&index)
    }

    pub fn all(&self) -> impl Iterator<Item = &FragmentEntity> {
        self.entities.values()
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut FragmentEntity> {
        self.entities.values_mut()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.entities.keys().copied().collect()
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.entities.values().map(FragmentEntity::node).collect()
    }

    pub fn index_of_node(&self, node: NodeId) -> Option<usize> {
        self.entities
            .values()
            .find(|entity| entity.node == node)
            .map(|entity| entity.index)
    }

    pub fn failed(&self) -> &BTreeSet<usize> {
        &self.failed
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Push entity state into the graph nodes the renderer and ray tests read.
    pub fn sync_graph(&self, graph: &mut SceneGraph) {
        for entity in self.entities.values() {
            if let Some(node) = graph.node_mut(entity.node) {
                node.transform = entity.transform;
                node.visible = entity.visible;
                node.opacity = entity.opacity;
            }
        }
    }

    /// Dispose one entity's GPU resources and drop it from the graph.
    pub fn dispose(
        &mut self,
        index: usize,
        graph: &mut SceneGraph,
        renderer: &mut dyn RenderBackend,
    ) -> bool {
        let Some(entity) = self.entities.remove(&index) else {
            return false;
        };
        for resource in graph.remove_subtree(entity.node) {
            renderer.dispose_resource(resource);
        }
        true
    }

    /// Dispose every entity and forget outstanding loads.
    pub fn dispose_all(&mut self, graph: &mut SceneGraph, renderer: &mut dyn RenderBackend) -> usize {
        let count = self.entities.len();
        for index in self.indices() {
            self.dispose(index, graph, renderer);
        }
        self.pending.clear();
        count
    }
}
