//! A workshop's gallery: image sets laid out along -z, scrolled with the
//! wheel. Planes fade with distance from the focus depth and ripple while
//! visible. "Back" fades to black and returns to the mirror.

use super::background::BackgroundSwapper;
use super::transition::{TransitionPipeline, TransitionStage};
use super::{Handoff, Scene, SceneContext, SceneError, SceneKind, ScenePhase, TeardownReport};
use crate::anim::{lerp, progress, AnimationDriver, AnimationOwner};
use crate::assets::{AssetCompletion, AssetKind, GallerySet, RequestId};
use crate::platform::{EventKind, InputEvent, Platform, SceneId};
use crate::render::{pointer_to_ndc, Node, NodeId, ResourceId, ResourceKind, Transform};
use crate::ui::{DomNodeId, DomNodeKind};
use glam::Vec3;
use std::collections::HashMap;

pub const SET_SPACING: f32 = 12.0;
pub const CAMERA_START_Z: f32 = 10.0;
/// Distance in front of the camera at which a plane is fully opaque.
pub const FOCUS_DISTANCE: f32 = 10.0;
pub const OPACITY_FALLOFF: f32 = 12.0;
/// World units scrolled per wheel delta unit.
pub const SCROLL_SPEED: f32 = 0.01;
const SCROLL_SMOOTHING_MS: f64 = 120.0;
const FADE_IN_MS: f64 = 1_000.0;
const WAVE_SPEED: f32 = 1.5;
const WAVE_DEPTH_SHIFT: f32 = 0.15;

const PRIMARY_SIZE: Vec3 = Vec3::new(8.0, 5.0, 1.0);
const DETAIL_SIZE: Vec3 = Vec3::new(3.5, 2.5, 1.0);
const DETAIL_OFFSET: Vec3 = Vec3::new(6.5, -1.5, -1.0);

/// Opacity of something at depth `z` seen from a camera at `camera_z`.
pub fn falloff_opacity(z: f32, camera_z: f32) -> f32 {
    let dz = (z - (camera_z - FOCUS_DISTANCE)).abs();
    1.0 - (dz / OPACITY_FALLOFF).clamp(0.0, 1.0)
}

/// Phase fed to the wave distortion, offset by depth so rows do not move in lockstep.
pub fn wave_phase(elapsed_ms: f64, z: f32) -> f32 {
    let seconds = (elapsed_ms / 1_000.0) as f32;
    (seconds * WAVE_SPEED + z * WAVE_DEPTH_SHIFT).rem_euclid(std::f32::consts::TAU)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Primary,
    Detail(usize),
}

impl Slot {
    fn transform(self, z: f32) -> Transform {
        match self {
            Slot::Primary => Transform {
                position: Vec3::new(0.0, 0.0, z),
                scale: PRIMARY_SIZE,
                ..Transform::default()
            },
            Slot::Detail(side) => {
                let sign = if side == 0 { -1.0 } else { 1.0 };
                Transform {
                    position: Vec3::new(sign * DETAIL_OFFSET.x, DETAIL_OFFSET.y, z + DETAIL_OFFSET.z),
                    scale: DETAIL_SIZE,
                    ..Transform::default()
                }
            }
        }
    }
}

#[derive(Debug)]
struct ImagePlane {
    node: NodeId,
    material: ResourceId,
    z: f32,
}

#[derive(Debug)]
struct Caption {
    title: DomNodeId,
    subtitle: DomNodeId,
    z: f32,
}

pub struct GalleryScene {
    ctx: SceneContext,
    driver: AnimationDriver<SceneContext>,
    pipeline: TransitionPipeline,
    background: BackgroundSwapper,
    workshop: usize,
    set_count: usize,
    planes: Vec<ImagePlane>,
    pending: HashMap<RequestId, (usize, Slot)>,
    captions: Vec<Caption>,
    scroll_target: f32,
    started_ms: f64,
    last_frame_ms: Option<f64>,
}

impl GalleryScene {
    pub fn new(id: SceneId, workshop: usize, platform: &mut Platform) -> Result<Self, SceneError> {
        let mut ctx = SceneContext::new(id, SceneKind::Gallery { workshop }, platform)?;
        ctx.camera.position = Vec3::new(0.0, 0.0, CAMERA_START_Z);
        Ok(Self {
            ctx,
            driver: AnimationDriver::new(),
            pipeline: TransitionPipeline::new(),
            background: BackgroundSwapper::new(platform.config.backgrounds.shape),
            workshop,
            set_count: 0,
            planes: Vec::new(),
            pending: HashMap::new(),
            captions: Vec::new(),
            scroll_target: 0.0,
            started_ms: 0.0,
            last_frame_ms: None,
        })
    }

    pub fn workshop(&self) -> usize {
        self.workshop
    }

    pub fn set_count(&self) -> usize {
        self.set_count
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn scroll_target(&self) -> f32 {
        self.scroll_target
    }

    pub fn max_scroll(&self) -> f32 {
        self.set_count.saturating_sub(1) as f32 * SET_SPACING
    }

    pub fn background(&self) -> &BackgroundSwapper {
        &self.background
    }

    /// Opacity currently applied to each loaded plane, in load order.
    pub fn plane_opacities(&self) -> Vec<f32> {
        self.planes
            .iter()
            .filter_map(|plane| self.ctx.graph.node(plane.node))
            .map(|node| node.opacity)
            .collect()
    }

    fn set_depth(set: usize) -> f32 {
        -(set as f32) * SET_SPACING
    }

    fn populate(&mut self, sets: &[GallerySet], platform: &mut Platform) {
        self.set_count = sets.len();
        for (index, set) in sets.iter().enumerate() {
            let z = Self::set_depth(index);
            let slots = [
                (Slot::Primary, &set.primary),
                (Slot::Detail(0), &set.details[0]),
                (Slot::Detail(1), &set.details[1]),
            ];
            for (slot, path) in slots {
                let request = platform.loader.request(AssetKind::Texture, path);
                self.pending.insert(request, (index, slot));
            }

            let title = self.ctx.create_dom_node(DomNodeKind::Caption, platform);
            platform.dom.set_text(title, &set.title);
            let subtitle = self.ctx.create_dom_node(DomNodeKind::Caption, platform);
            platform.dom.set_text(subtitle, &set.subtitle);
            self.captions.push(Caption { title, subtitle, z });
        }
        log::info!(
            "Gallery {}: {} set(s), {} image(s) requested",
            self.workshop,
            sets.len(),
            self.pending.len()
        );
    }

    fn follow_scroll(&mut self, dt_ms: f64) {
        let desired = CAMERA_START_Z - self.scroll_target;
        let blend = 1.0 - (-dt_ms.max(0.0) / SCROLL_SMOOTHING_MS).exp();
        let camera = &mut self.ctx.camera;
        camera.position.z = lerp(camera.position.z, desired, blend as f32);
    }

    fn apply_depth_effects(&mut self, now_ms: f64, platform: &mut Platform) {
        let camera_z = self.ctx.camera.position.z;
        let elapsed = now_ms - self.started_ms;
        for plane in &self.planes {
            let opacity = falloff_opacity(plane.z, camera_z);
            if let Some(node) = self.ctx.graph.node_mut(plane.node) {
                node.opacity = opacity;
                node.visible = opacity > 0.0;
            }
            platform.renderer.set_uniform(plane.material, "opacity", opacity);
            if opacity > 0.0 {
                platform
                    .renderer
                    .set_uniform(plane.material, "wave_phase", wave_phase(elapsed, plane.z));
            }
        }
        for caption in &self.captions {
            let opacity = falloff_opacity(caption.z, camera_z);
            platform.dom.set_opacity(caption.title, opacity);
            platform.dom.set_opacity(caption.subtitle, opacity);
        }
    }
}

impl Scene for GalleryScene {
    fn context(&self) -> &SceneContext {
        &self.ctx
    }

    fn start(&mut self, now_ms: f64, platform: &mut Platform) {
        for kind in [
            EventKind::PointerMove,
            EventKind::Wheel,
            EventKind::Back,
            EventKind::Resize,
        ] {
            self.ctx.listen(kind, platform);
        }

        let (sets, background) = match platform.content.workshop(self.workshop) {
            Ok(content) => {
                let key = platform
                    .config
                    .fragment(self.workshop)
                    .map(|fragment| fragment.category_key.as_str());
                let background = content
                    .background
                    .clone()
                    .unwrap_or_else(|| platform.config.backgrounds.path_for(key).to_string());
                (content.sets.clone(), Some(background))
            }
            Err(err) => {
                log::error!("Gallery {} has nothing to show: {}", self.workshop, err);
                (Vec::new(), None)
            }
        };
        self.populate(&sets, platform);
        if let Some(path) = background {
            self.background.set_path(&path, platform.loader.as_mut());
        }

        self.ctx.overlay.color = platform.config.fades.portal;
        self.ctx.overlay.opacity = 1.0;
        self.driver.run_owned(
            AnimationOwner::Overlay,
            now_ms,
            Box::new(|elapsed: f64, ctx: &mut SceneContext| {
                let t = progress(elapsed, FADE_IN_MS);
                ctx.overlay.opacity = 1.0 - t;
                t < 1.0
            }),
        );

        self.started_ms = now_ms;
        self.last_frame_ms = Some(now_ms);
        self.ctx.start_loop();
        log::info!("Gallery scene {:?} running", self.ctx.id);
    }

    fn handle_input(&mut self, event: &InputEvent, now_ms: f64, platform: &mut Platform) {
        if self.ctx.phase != ScenePhase::Running || !self.ctx.is_listening(event.kind(), platform) {
            return;
        }
        match *event {
            InputEvent::PointerMove { x, y } => {
                self.ctx.pointer_ndc = Some(pointer_to_ndc(x, y, self.ctx.viewport));
            }
            InputEvent::Wheel { delta_y } => {
                if self.pipeline.stage().is_leaving() {
                    return;
                }
                self.scroll_target =
                    (self.scroll_target + delta_y * SCROLL_SPEED).clamp(0.0, self.max_scroll());
            }
            InputEvent::Back => {
                let color = platform.config.fades.back;
                self.pipeline.begin_fade_out(
                    SceneKind::Mirror,
                    now_ms,
                    &mut self.driver,
                    &mut self.ctx,
                    color,
                );
            }
            InputEvent::Resize(viewport) => self.ctx.resize(viewport, platform),
            InputEvent::Click { .. } | InputEvent::Confirm => {}
        }
    }

    fn owns_request(&self, request: RequestId) -> bool {
        self.pending.contains_key(&request) || self.background.owns_request(request)
    }

    fn on_asset(&mut self, completion: AssetCompletion, platform: &mut Platform) {
        let AssetCompletion { request, result } = completion;
        let Some((set, slot)) = self.pending.remove(&request) else {
            self.background.on_loaded(
                request,
                result,
                &mut self.ctx.graph,
                platform.renderer.as_mut(),
            );
            return;
        };
        let handle = match result {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!("Gallery {} set {} {:?} skipped: {}", self.workshop, set, slot, err);
                return;
            }
        };

        let z = Self::set_depth(set);
        let transform = slot.transform(z);
        let material = platform
            .renderer
            .create_resource(ResourceKind::Material, &handle.path);
        let resources = vec![
            platform
                .renderer
                .create_resource(ResourceKind::Geometry, "gallery-plane"),
            material,
            platform
                .renderer
                .create_resource(ResourceKind::Texture, &handle.path),
        ];
        let node = self.ctx.graph.add_node(
            Node::new(format!("gallery-{set}-{slot:?}"))
                .with_transform(transform)
                .with_resources(resources),
        );
        self.planes.push(ImagePlane {
            node,
            material,
            z: transform.position.z,
        });
    }

    fn update(&mut self, now_ms: f64, platform: &mut Platform) -> Option<Handoff> {
        if self.ctx.phase != ScenePhase::Running {
            return None;
        }
        let dt_ms = now_ms - self.last_frame_ms.unwrap_or(now_ms);
        self.last_frame_ms = Some(now_ms);

        self.driver.tick(now_ms, &mut self.ctx);
        let handoff = self
            .pipeline
            .update(now_ms, &mut self.driver, &mut self.ctx);
        self.follow_scroll(dt_ms);
        self.apply_depth_effects(now_ms, platform);
        self.ctx.sync_overlay(platform);
        self.ctx.render(platform);
        handoff
    }

    fn stage(&self) -> TransitionStage {
        self.pipeline.stage()
    }

    fn stop(&mut self) {
        self.driver.cancel_all();
        self.ctx.stop_loop();
    }

    fn release(&mut self, platform: &mut Platform) -> TeardownReport {
        let report = self.ctx.release(platform);
        self.background.forget();
        self.planes.clear();
        self.captions.clear();
        self.pending.clear();
        report
    }
}
