//! Scenes and the state they share.
//!
//! A scene owns one render surface, one scene graph and one camera for its
//! whole life. Everything it installs on the platform (listeners, DOM nodes,
//! GPU resources) is recorded on its [`SceneContext`] so teardown can undo
//! exactly that and nothing else.

pub mod background;
pub mod director;
pub mod gallery;
pub mod history;
pub mod interaction;
pub mod layout;
pub mod mirror;
pub mod registry;
pub mod transition;

pub use director::{SceneDirector, SceneSwitch, SwitchError};
pub use layout::LayoutProfile;
pub use transition::{TransitionPipeline, TransitionStage};

use crate::assets::{AssetCompletion, RequestId};
use crate::platform::{EventKind, InputEvent, ListenerId, ListenerOwner, Platform, SceneId};
use crate::render::{Camera, RenderError, SceneGraph, SurfaceHandle, Viewport};
use crate::ui::{DomNodeId, DomNodeKind};
use glam::{Vec2, Vec3};
use registry::FragmentRegistry;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
    Mirror,
    Gallery { workshop: usize },
}

impl SceneKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mirror => "mirror",
            Self::Gallery { .. } => "gallery",
        }
    }

    /// Navigation path recorded in the history for this scene.
    pub fn path(&self) -> String {
        match self {
            Self::Mirror => "/".to_string(),
            Self::Gallery { workshop } => format!("/workshop/{workshop}"),
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mirror => write!(f, "mirror"),
            Self::Gallery { workshop } => write!(f, "gallery #{workshop}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenePhase {
    Uninitialized,
    Initializing,
    Running,
    TearingDown,
    Disposed,
}

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene setup failed: {0}")]
    Render(#[from] RenderError),
}

/// Request from a finished transition to move to another scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub target: SceneKind,
    /// Fragment index and category key the transition started from.
    pub origin: Option<(usize, String)>,
}

/// What a teardown released, for logging and leak checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub listeners: usize,
    pub fragments: usize,
    pub resources: usize,
    pub dom_nodes: usize,
}

/// Full-viewport fade overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub node: Option<DomNodeId>,
    pub opacity: f32,
    pub color: [f32; 3],
}

/// State every scene owns. Animation steps receive this mutably.
pub struct SceneContext {
    pub id: SceneId,
    pub kind: SceneKind,
    pub phase: ScenePhase,
    pub graph: SceneGraph,
    pub camera: Camera,
    pub registry: FragmentRegistry,
    pub layout: LayoutProfile,
    pub viewport: Viewport,
    pub overlay: Overlay,
    pub pointer_ndc: Option<Vec2>,
    surface: Option<SurfaceHandle>,
    loop_running: bool,
    listeners: Vec<ListenerId>,
    dom_nodes: Vec<DomNodeId>,
}

impl SceneContext {
    /// Create the render surface and camera. The scene starts `Initializing`.
    pub fn new(id: SceneId, kind: SceneKind, platform: &mut Platform) -> Result<Self, SceneError> {
        let viewport = platform.viewport;
        let layout = LayoutProfile::for_viewport(viewport);
        let surface = platform.renderer.create_surface(viewport)?;
        let mut camera = Camera::facing_scene(Vec3::new(0.0, 0.0, layout.camera_distance()));
        camera.set_viewport(viewport);
        log::debug!("{} scene {:?}: surface {:?}, {:?} layout", kind, id, surface, layout);

        Ok(Self {
            id,
            kind,
            phase: ScenePhase::Initializing,
            graph: SceneGraph::new(),
            camera,
            registry: FragmentRegistry::new(layout),
            layout,
            viewport,
            overlay: Overlay {
                node: None,
                opacity: 0.0,
                color: platform.config.fades.portal,
            },
            pointer_ndc: None,
            surface: Some(surface),
            loop_running: false,
            listeners: Vec::new(),
            dom_nodes: Vec::new(),
        })
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    pub fn is_loop_running(&self) -> bool {
        self.loop_running
    }

    pub fn start_loop(&mut self) {
        self.loop_running = true;
        self.phase = ScenePhase::Running;
    }

    /// No frame is drawn after this returns.
    pub fn stop_loop(&mut self) {
        self.loop_running = false;
        if self.phase != ScenePhase::Disposed {
            self.phase = ScenePhase::TearingDown;
        }
    }

    pub fn listen(&mut self, kind: EventKind, platform: &mut Platform) -> ListenerId {
        let id = platform
            .events
            .add_listener(kind, ListenerOwner::Scene(self.id));
        self.listeners.push(id);
        id
    }

    pub fn is_listening(&self, kind: EventKind, platform: &Platform) -> bool {
        platform
            .events
            .is_listening(kind, ListenerOwner::Scene(self.id))
    }

    pub fn create_dom_node(&mut self, kind: DomNodeKind, platform: &mut Platform) -> DomNodeId {
        let node = platform.dom.create_node(kind);
        self.dom_nodes.push(node);
        node
    }

    pub fn dom_node_count(&self) -> usize {
        self.dom_nodes.len()
    }

    /// Mirror the overlay state into its DOM node, creating it on first use.
    pub fn sync_overlay(&mut self, platform: &mut Platform) {
        if self.overlay.node.is_none() && self.overlay.opacity > 0.0 {
            let node = self.create_dom_node(DomNodeKind::Overlay, platform);
            platform.dom.set_color(node, self.overlay.color);
            self.overlay.node = Some(node);
        }
        if let Some(node) = self.overlay.node {
            platform.dom.set_opacity(node, self.overlay.opacity);
        }
    }

    pub fn resize(&mut self, viewport: Viewport, platform: &mut Platform) {
        self.viewport = viewport;
        self.camera.set_viewport(viewport);
        self.layout = LayoutProfile::for_viewport(viewport);
        if let Some(surface) = self.surface {
            platform.renderer.resize(surface, viewport);
        }
    }

    /// Draw one frame, forwarding the pointer to the post-process stage.
    pub fn render(&mut self, platform: &mut Platform) {
        if !self.loop_running {
            return;
        }
        let Some(surface) = self.surface else {
            return;
        };
        if let Some(ndc) = self.pointer_ndc {
            platform.renderer.set_pointer_uniform(surface, ndc);
        }
        platform.renderer.render(surface, &self.graph, &self.camera);
    }

    /// Remove listeners, fragments, GPU resources and the surface, then DOM
    /// nodes, in that order. Stops the loop first if the caller did not.
    pub fn release(&mut self, platform: &mut Platform) -> TeardownReport {
        if self.loop_running {
            log::warn!("Scene {:?} released while its loop was running", self.id);
            self.stop_loop();
        }
        let mut report = TeardownReport::default();

        for id in self.listeners.drain(..) {
            if platform.events.remove_listener(id) {
                report.listeners += 1;
            }
        }

        report.fragments = self
            .registry
            .dispose_all(&mut self.graph, platform.renderer.as_mut());
        for resource in self.graph.clear() {
            platform.renderer.dispose_resource(resource);
            report.resources += 1;
        }
        if let Some(surface) = self.surface.take() {
            platform.renderer.dispose_surface(surface);
        }

        for node in self.dom_nodes.drain(..) {
            platform.dom.remove_node(node);
            report.dom_nodes += 1;
        }

        self.overlay.node = None;
        self.pointer_ndc = None;
        self.phase = ScenePhase::Disposed;
        report
    }
}

/// Behavior a scene plugs into the director.
pub trait Scene {
    fn context(&self) -> &SceneContext;

    /// Install listeners, create DOM nodes and request assets, then start the loop.
    fn start(&mut self, now_ms: f64, platform: &mut Platform);

    fn handle_input(&mut self, event: &InputEvent, now_ms: f64, platform: &mut Platform);

    fn owns_request(&self, request: RequestId) -> bool;

    fn on_asset(&mut self, completion: AssetCompletion, platform: &mut Platform);

    /// Run one frame. Returns a hand-off once a transition has finished.
    fn update(&mut self, now_ms: f64, platform: &mut Platform) -> Option<Handoff>;

    fn stage(&self) -> TransitionStage;

    /// Stop drawing and cancel every animation and timer.
    fn stop(&mut self);

    /// Release everything `start` installed. Only called after `stop`.
    fn release(&mut self, platform: &mut Platform) -> TeardownReport;

    fn phase(&self) -> ScenePhase {
        self.context().phase
    }

    fn kind(&self) -> SceneKind {
        self.context().kind
    }
}
