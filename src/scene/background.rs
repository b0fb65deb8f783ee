//! Environment background: one textured sphere (or backdrop plane) at a time.

use crate::assets::{AssetError, AssetHandle, AssetKind, AssetLoader, RequestId};
use crate::config::{BackgroundConfig, BackgroundShape};
use crate::render::{Node, NodeId, RenderBackend, ResourceKind, SceneGraph, Transform};
use glam::Vec3;
use std::collections::HashSet;

pub const BACKGROUND_NODE: &str = "background";

const SPHERE_RADIUS: f32 = 500.0;
const PLANE_DEPTH: f32 = 60.0;
const PLANE_SIZE: Vec3 = Vec3::new(160.0, 90.0, 1.0);

#[derive(Debug)]
struct Installed {
    path: String,
    node: NodeId,
}

#[derive(Debug)]
struct Pending {
    request: RequestId,
    path: String,
}

#[derive(Debug)]
pub struct BackgroundSwapper {
    shape: BackgroundShape,
    active: Option<Installed>,
    pending: Option<Pending>,
    superseded: HashSet<RequestId>,
}

impl BackgroundSwapper {
    pub fn new(shape: BackgroundShape) -> Self {
        Self {
            shape,
            active: None,
            pending: None,
            superseded: HashSet::new(),
        }
    }

    /// Swap to the background for `key`, or the default for `None` and
    /// unknown keys. Returns whether a load was requested.
    pub fn set_background(
        &mut self,
        key: Option<&str>,
        config: &BackgroundConfig,
        loader: &mut dyn AssetLoader,
    ) -> bool {
        let path = config.path_for(key).to_string();
        self.set_path(&path, loader)
    }

    pub fn set_path(&mut self, path: &str, loader: &mut dyn AssetLoader) -> bool {
        if self.pending.as_ref().is_some_and(|pending| pending.path == path) {
            return false;
        }
        if let Some(stale) = self.pending.take() {
            self.superseded.insert(stale.request);
        }
        if self.active_path() == Some(path) {
            return false;
        }
        let request = loader.request(AssetKind::Texture, path);
        log::debug!("Requested background {} ({:?})", path, request);
        self.pending = Some(Pending {
            request,
            path: path.to_string(),
        });
        true
    }

    pub fn owns_request(&self, request: RequestId) -> bool {
        self.superseded.contains(&request)
            || self
                .pending
                .as_ref()
                .is_some_and(|pending| pending.request == request)
    }

    /// Install a finished load, removing the previous background first.
    /// Failed and superseded loads leave the current background in place.
    pub fn on_loaded(
        &mut self,
        request: RequestId,
        result: Result<AssetHandle, AssetError>,
        graph: &mut SceneGraph,
        renderer: &mut dyn RenderBackend,
    ) -> bool {
        if self.superseded.remove(&request) {
            log::debug!("Dropping superseded background load {:?}", request);
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if pending.request != request {
            self.pending = Some(pending);
            return false;
        }

        let handle = match result {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!("Background {} failed, keeping current: {}", pending.path, err);
                return false;
            }
        };

        if let Some(previous) = self.active.take() {
            for resource in graph.remove_subtree(previous.node) {
                renderer.dispose_resource(resource);
            }
        }

        let (label, transform) = match self.shape {
            BackgroundShape::Sphere => (
                "background-sphere",
                Transform {
                    scale: Vec3::splat(SPHERE_RADIUS),
                    ..Transform::default()
                },
            ),
            BackgroundShape::Plane => (
                "background-plane",
                Transform {
                    position: Vec3::new(0.0, 0.0, -PLANE_DEPTH),
                    scale: PLANE_SIZE,
                    ..Transform::default()
                },
            ),
        };
        let resources = vec![
            renderer.create_resource(ResourceKind::Geometry, label),
            renderer.create_resource(ResourceKind::Material, label),
            renderer.create_resource(ResourceKind::Texture, &handle.path),
        ];
        let node = graph.add_node(
            Node::new(BACKGROUND_NODE)
                .with_transform(transform)
                .with_resources(resources),
        );
        log::info!("Background set to {}", pending.path);
        self.active = Some(Installed {
            path: pending.path,
            node,
        });
        true
    }

    pub fn active_path(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.path.as_str())
    }

    pub fn active_node(&self) -> Option<NodeId> {
        self.active.as_ref().map(|active| active.node)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop every reference once the owning graph has been cleared.
    pub fn forget(&mut self) {
        self.active = None;
        self.pending = None;
        self.superseded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{HeadlessRenderer, ScriptedLoader};

    struct Rig {
        swapper: BackgroundSwapper,
        config: BackgroundConfig,
        graph: SceneGraph,
        renderer: HeadlessRenderer,
        loader: ScriptedLoader,
    }

    impl Rig {
        fn new() -> Self {
            let mut config = BackgroundConfig::default();
            config.by_category.insert("A".into(), "bg/a.jpg".into());
            config.by_category.insert("B".into(), "bg/b.jpg".into());
            Self {
                swapper: BackgroundSwapper::new(BackgroundShape::Sphere),
                config,
                graph: SceneGraph::new(),
                renderer: HeadlessRenderer::new(),
                loader: ScriptedLoader::new(),
            }
        }

        fn set(&mut self, key: Option<&str>) -> bool {
            self.swapper
                .set_background(key, &self.config, &mut self.loader)
        }

        fn pump(&mut self) {
            for done in self.loader.poll() {
                assert!(self.swapper.owns_request(done.request));
                self.swapper
                    .on_loaded(done.request, done.result, &mut self.graph, &mut self.renderer);
            }
        }

        fn background_nodes(&self) -> usize {
            self.graph
                .iter()
                .filter(|(_, node)| node.name == BACKGROUND_NODE)
                .count()
        }
    }

    #[test]
    fn same_key_twice_yields_one_node() {
        let mut rig = Rig::new();
        assert!(rig.set(Some("A")));
        assert!(!rig.set(Some("A")));
        rig.pump();
        assert!(!rig.set(Some("A")));
        rig.pump();
        assert_eq!(rig.background_nodes(), 1);
        assert_eq!(rig.loader.script().borrow().requested.len(), 1);
        assert_eq!(rig.swapper.active_path(), Some("bg/a.jpg"));
    }

    #[test]
    fn swap_removes_previous_node_and_resources() {
        let mut rig = Rig::new();
        let log = rig.renderer.log();
        rig.set(Some("A"));
        rig.pump();
        rig.set(Some("B"));
        rig.pump();
        assert_eq!(rig.background_nodes(), 1);
        assert_eq!(rig.swapper.active_path(), Some("bg/b.jpg"));
        assert_eq!(log.borrow().live_resources.len(), 3);
        assert!(log.borrow().violations.is_empty());
    }

    #[test]
    fn unknown_key_uses_default() {
        let mut rig = Rig::new();
        rig.set(Some("Z"));
        rig.pump();
        assert_eq!(rig.swapper.active_path(), Some("backgrounds/default.jpg"));
    }

    #[test]
    fn failure_keeps_prior_background() {
        let mut rig = Rig::new();
        rig.loader.script().borrow_mut().fail("bg/b.jpg");
        rig.set(Some("A"));
        rig.pump();
        let node = rig.swapper.active_node();
        rig.set(Some("B"));
        rig.pump();
        assert_eq!(rig.swapper.active_node(), node);
        assert_eq!(rig.swapper.active_path(), Some("bg/a.jpg"));
        assert!(!rig.swapper.is_loading());
    }

    #[test]
    fn superseded_load_is_dropped() {
        let mut rig = Rig::new();
        let log = rig.renderer.log();
        rig.set(Some("A"));
        rig.set(Some("B"));
        rig.pump();
        assert_eq!(rig.background_nodes(), 1);
        assert_eq!(rig.swapper.active_path(), Some("bg/b.jpg"));
        assert_eq!(log.borrow().live_resources.len(), 3);
    }

    #[test]
    fn returning_to_active_cancels_pending() {
        let mut rig = Rig::new();
        rig.set(Some("A"));
        rig.pump();
        rig.set(Some("B"));
        assert!(!rig.set(Some("A")));
        rig.pump();
        assert_eq!(rig.swapper.active_path(), Some("bg/a.jpg"));
        assert_eq!(rig.background_nodes(), 1);
    }

    #[test]
    fn plane_shape_sits_behind_fragments() {
        let mut rig = Rig::new();
        rig.swapper = BackgroundSwapper::new(BackgroundShape::Plane);
        rig.set(None);
        rig.pump();
        let node = rig.swapper.active_node().unwrap();
        assert!(rig.graph.node(node).unwrap().transform.position.z < 0.0);
    }
}
