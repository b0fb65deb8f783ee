mod camera;
pub mod graph;
pub mod pick;

pub use camera::{pointer_to_ndc, Camera, Ray};
pub use graph::{Aabb, Node, NodeId, NodeIdentity, SceneGraph, Transform};
pub use pick::{find_owner_with_identity, resolve, PickHit};

use glam::Vec2;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create render surface ({width}x{height})")]
    SurfaceCreateFailed { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
    Texture,
}

/// Rendering backend the scenes draw through. Concrete GPU work (including the
/// water post-process) lives behind this trait.
pub trait RenderBackend {
    fn create_surface(&mut self, viewport: Viewport) -> Result<SurfaceHandle, RenderError>;
    fn resize(&mut self, surface: SurfaceHandle, viewport: Viewport);
    fn render(&mut self, surface: SurfaceHandle, graph: &SceneGraph, camera: &Camera);
    fn dispose_surface(&mut self, surface: SurfaceHandle);

    fn create_resource(&mut self, kind: ResourceKind, label: &str) -> ResourceId;
    fn dispose_resource(&mut self, resource: ResourceId);
    fn set_uniform(&mut self, resource: ResourceId, name: &str, value: f32);

    /// Pointer position (NDC) consumed by the post-process stage.
    fn set_pointer_uniform(&mut self, surface: SurfaceHandle, ndc: Vec2);
}
