//! Recording collaborators: a renderer and DOM host that only keep books,
//! and a loader whose outcomes are scripted. Used by the window host (which
//! has no GPU backend of its own) and by the test-suite.

use crate::assets::{AssetCompletion, AssetError, AssetHandle, AssetKind, AssetLoader, RequestId};
use crate::render::{
    Camera, RenderBackend, RenderError, ResourceId, ResourceKind, SceneGraph, SurfaceHandle,
    Viewport,
};
use crate::ui::{DomHost, DomNodeId, DomNodeKind};
use glam::Vec2;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    CreateSurface(SurfaceHandle),
    Resize(SurfaceHandle, Viewport),
    Render { surface: SurfaceHandle, drawn: usize },
    DisposeSurface(SurfaceHandle),
    CreateResource(ResourceId, ResourceKind),
    DisposeResource(ResourceId),
}

#[derive(Debug, Default)]
pub struct RenderLog {
    pub ops: Vec<RenderOp>,
    pub live_surfaces: BTreeSet<SurfaceHandle>,
    pub live_resources: BTreeSet<ResourceId>,
    pub uniforms: BTreeMap<(ResourceId, String), f32>,
    pub pointer: Option<Vec2>,
    pub frames: u64,
    /// Set when a resource is disposed twice or a dead surface is drawn.
    pub violations: Vec<String>,
}

#[derive(Default)]
pub struct HeadlessRenderer {
    next_id: u64,
    log: Rc<RefCell<RenderLog>>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Rc<RefCell<RenderLog>> {
        Rc::clone(&self.log)
    }
}

impl RenderBackend for HeadlessRenderer {
    fn create_surface(&mut self, viewport: Viewport) -> Result<SurfaceHandle, RenderError> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(RenderError::SurfaceCreateFailed {
                width: viewport.width,
                height: viewport.height,
            });
        }
        self.next_id += 1;
        let surface = SurfaceHandle(self.next_id);
        let mut log = self.log.borrow_mut();
        log.ops.push(RenderOp::CreateSurface(surface));
        log.live_surfaces.insert(surface);
        Ok(surface)
    }

    fn resize(&mut self, surface: SurfaceHandle, viewport: Viewport) {
        self.log.borrow_mut().ops.push(RenderOp::Resize(surface, viewport));
    }

    fn render(&mut self, surface: SurfaceHandle, graph: &SceneGraph, _camera: &Camera) {
        let drawn = graph
            .iter()
            .filter(|(id, _)| graph.is_visible_in_world(*id))
            .count();
        let mut log = self.log.borrow_mut();
        if !log.live_surfaces.contains(&surface) {
            log.violations.push(format!("render on dead surface {:?}", surface));
        }
        log.frames += 1;
        log.ops.push(RenderOp::Render { surface, drawn });
    }

    fn dispose_surface(&mut self, surface: SurfaceHandle) {
        let mut log = self.log.borrow_mut();
        if !log.live_surfaces.remove(&surface) {
            log.violations.push(format!("double dispose of surface {:?}", surface));
        }
        log.ops.push(RenderOp::DisposeSurface(surface));
    }

    fn create_resource(&mut self, kind: ResourceKind, _label: &str) -> ResourceId {
        self.next_id += 1;
        let resource = ResourceId(self.next_id);
        let mut log = self.log.borrow_mut();
        log.live_resources.insert(resource);
        log.ops.push(RenderOp::CreateResource(resource, kind));
        resource
    }

    fn dispose_resource(&mut self, resource: ResourceId) {
        let mut log = self.log.borrow_mut();
        if !log.live_resources.remove(&resource) {
            log.violations.push(format!("double dispose of resource {:?}", resource));
        }
        log.ops.push(RenderOp::DisposeResource(resource));
    }

    fn set_uniform(&mut self, resource: ResourceId, name: &str, value: f32) {
        self.log
            .borrow_mut()
            .uniforms
            .insert((resource, name.to_string()), value);
    }

    fn set_pointer_uniform(&mut self, _surface: SurfaceHandle, ndc: Vec2) {
        self.log.borrow_mut().pointer = Some(ndc);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomNodeState {
    pub kind: DomNodeKind,
    pub text: String,
    pub opacity: f32,
    pub visible: bool,
    pub color: [f32; 3],
}

#[derive(Debug, Default)]
pub struct DomLog {
    pub nodes: BTreeMap<DomNodeId, DomNodeState>,
    pub removed: Vec<DomNodeId>,
}

impl DomLog {
    pub fn of_kind(&self, kind: DomNodeKind) -> Vec<&DomNodeState> {
        self.nodes.values().filter(|node| node.kind == kind).collect()
    }
}

#[derive(Default)]
pub struct HeadlessDom {
    next_id: u64,
    log: Rc<RefCell<DomLog>>,
}

impl HeadlessDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Rc<RefCell<DomLog>> {
        Rc::clone(&self.log)
    }

    fn with_node(&self, node: DomNodeId, apply: impl FnOnce(&mut DomNodeState)) {
        match self.log.borrow_mut().nodes.get_mut(&node) {
            Some(state) => apply(state),
            None => log::warn!("DOM node {:?} is not attached", node),
        }
    }
}

impl DomHost for HeadlessDom {
    fn create_node(&mut self, kind: DomNodeKind) -> DomNodeId {
        self.next_id += 1;
        let node = DomNodeId(self.next_id);
        self.log.borrow_mut().nodes.insert(
            node,
            DomNodeState {
                kind,
                text: String::new(),
                opacity: 1.0,
                visible: true,
                color: [1.0, 1.0, 1.0],
            },
        );
        node
    }

    fn set_text(&mut self, node: DomNodeId, text: &str) {
        if !text.is_empty() {
            log::debug!("label {:?}: {}", node, text);
        }
        self.with_node(node, |state| state.text = text.to_string());
    }

    fn set_opacity(&mut self, node: DomNodeId, opacity: f32) {
        self.with_node(node, |state| state.opacity = opacity);
    }

    fn set_visible(&mut self, node: DomNodeId, visible: bool) {
        self.with_node(node, |state| state.visible = visible);
    }

    fn set_color(&mut self, node: DomNodeId, rgb: [f32; 3]) {
        self.with_node(node, |state| state.color = rgb);
    }

    fn remove_node(&mut self, node: DomNodeId) {
        let mut log = self.log.borrow_mut();
        if log.nodes.remove(&node).is_some() {
            log.removed.push(node);
        } else {
            log::warn!("DOM node {:?} removed twice", node);
        }
    }
}

#[derive(Debug, Default)]
pub struct LoaderScript {
    /// Paths whose loads fail.
    pub failing: HashSet<String>,
    /// While held, requests queue up and `poll` delivers nothing.
    pub held: bool,
    /// Deliver queued completions newest-first.
    pub reverse: bool,
    pub requested: Vec<(RequestId, AssetKind, String)>,
    pending: Vec<(RequestId, AssetKind, String)>,
}

impl LoaderScript {
    pub fn fail(&mut self, path: &str) {
        self.failing.insert(path.to_string());
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Loader that resolves every request on the next `poll`, failing scripted paths.
#[derive(Default)]
pub struct ScriptedLoader {
    next_request: u64,
    script: Rc<RefCell<LoaderScript>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self) -> Rc<RefCell<LoaderScript>> {
        Rc::clone(&self.script)
    }
}

impl AssetLoader for ScriptedLoader {
    fn request(&mut self, kind: AssetKind, path: &str) -> RequestId {
        self.next_request += 1;
        let request = RequestId(self.next_request);
        let mut script = self.script.borrow_mut();
        script.requested.push((request, kind, path.to_string()));
        script.pending.push((request, kind, path.to_string()));
        request
    }

    fn poll(&mut self) -> Vec<AssetCompletion> {
        let mut script = self.script.borrow_mut();
        if script.held {
            return Vec::new();
        }
        let mut pending = std::mem::take(&mut script.pending);
        if script.reverse {
            pending.reverse();
        }
        pending
            .into_iter()
            .map(|(request, kind, path)| {
                let result = if script.failing.contains(&path) {
                    Err(AssetError::Unavailable { path })
                } else {
                    Ok(AssetHandle {
                        kind,
                        path,
                        byte_len: 0,
                        dimensions: None,
                    })
                };
                AssetCompletion { request, result }
            })
            .collect()
    }
}
