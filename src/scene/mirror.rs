//! The opening scene: an intact mirror that shatters into one fragment per
//! workshop. Hovering and selecting fragments drives labels and the
//! background; confirming a selection starts the portal transition.

use super::background::BackgroundSwapper;
use super::interaction::{InteractionEffect, InteractionState};
use super::registry::FragmentRegistry;
use super::transition::{self, TransitionPipeline, TransitionStage};
use super::{Handoff, Scene, SceneContext, SceneError, SceneKind, ScenePhase, TeardownReport};
use crate::anim::AnimationDriver;
use crate::assets::{AssetCompletion, AssetError, AssetHandle, AssetKind, RequestId};
use crate::platform::{EventKind, InputEvent, Platform, SceneId};
use crate::render::{pointer_to_ndc, resolve, Aabb, Node, NodeId, ResourceKind};
use crate::ui::{DomNodeId, DomNodeKind, LabelFader};
use glam::Vec3;

const MIRROR_HALF_EXTENTS: Vec3 = Vec3::new(12.0, 9.0, 0.3);

pub struct MirrorScene {
    ctx: SceneContext,
    driver: AnimationDriver<SceneContext>,
    interaction: InteractionState,
    pipeline: TransitionPipeline,
    background: BackgroundSwapper,
    mirror: Option<NodeId>,
    mirror_request: Option<RequestId>,
    label: Option<DomNodeId>,
    label_fader: LabelFader,
    continue_button: Option<DomNodeId>,
    last_frame_ms: Option<f64>,
}

impl MirrorScene {
    /// `seed` makes auto-selection reproducible.
    pub fn new(id: SceneId, platform: &mut Platform, seed: Option<u64>) -> Result<Self, SceneError> {
        let ctx = SceneContext::new(id, SceneKind::Mirror, platform)?;
        let interaction = match seed {
            Some(seed) => InteractionState::with_seed(seed),
            None => InteractionState::default(),
        };
        Ok(Self {
            ctx,
            driver: AnimationDriver::new(),
            interaction,
            pipeline: TransitionPipeline::new(),
            background: BackgroundSwapper::new(platform.config.backgrounds.shape),
            mirror: None,
            mirror_request: None,
            label: None,
            label_fader: LabelFader::new(),
            continue_button: None,
            last_frame_ms: None,
        })
    }

    pub fn registry(&self) -> &FragmentRegistry {
        &self.ctx.registry
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn pipeline(&self) -> &TransitionPipeline {
        &self.pipeline
    }

    pub fn background(&self) -> &BackgroundSwapper {
        &self.background
    }

    pub fn mirror_node(&self) -> Option<NodeId> {
        self.mirror
    }

    pub fn label_opacity(&self) -> f32 {
        self.label_fader.opacity()
    }

    /// Shatter the mirror. Returns `false` if it is already broken.
    pub fn break_mirror(&mut self, now_ms: f64) -> bool {
        if !self.pipeline.begin_break(now_ms, &mut self.driver, &mut self.ctx) {
            return false;
        }
        if let Some(node) = self.mirror.and_then(|id| self.ctx.graph.node_mut(id)) {
            node.visible = false;
        }
        self.interaction.arm_auto_select(now_ms);
        log::info!(
            "Mirror broken into {} fragment(s)",
            self.ctx.registry.len() + self.ctx.registry.pending_count()
        );
        true
    }

    fn pick(&mut self, x: f32, y: f32) -> Option<usize> {
        let ndc = pointer_to_ndc(x, y, self.ctx.viewport);
        self.ctx.pointer_ndc = Some(ndc);
        if !self.pipeline.is_broken() {
            return None;
        }
        self.ctx.registry.sync_graph(&mut self.ctx.graph);
        let candidates = self.ctx.registry.nodes();
        resolve(ndc, &self.ctx.camera, &self.ctx.graph, &candidates).map(|hit| hit.identity.index)
    }

    fn apply(&mut self, effects: Vec<InteractionEffect>, now_ms: f64, platform: &mut Platform) {
        for effect in effects {
            match effect {
                InteractionEffect::ResetFocus(index) => {
                    transition::start_reset(index, now_ms, &mut self.driver, &mut self.ctx);
                }
                InteractionEffect::FocusForward(index) => {
                    transition::start_hover_forward(index, now_ms, &mut self.driver, &mut self.ctx);
                }
                InteractionEffect::ShowLabel(Some(index)) => {
                    let text = platform
                        .config
                        .fragment(index)
                        .map(|fragment| fragment.label().to_string())
                        .unwrap_or_default();
                    if let Some(label) = self.label {
                        platform.dom.set_text(label, &text);
                    }
                    self.label_fader.show();
                }
                InteractionEffect::ShowLabel(None) => self.label_fader.hide(),
                InteractionEffect::SetBackground(index) => {
                    let key = index
                        .and_then(|index| self.ctx.registry.get(index))
                        .map(|entity| entity.category_key.clone());
                    self.background.set_background(
                        key.as_deref(),
                        &platform.config.backgrounds,
                        platform.loader.as_mut(),
                    );
                }
                InteractionEffect::ShowContinue(visible) => {
                    if let Some(button) = self.continue_button {
                        platform.dom.set_visible(button, visible);
                    }
                }
                InteractionEffect::BeginTransition(index) => {
                    let color = platform.config.fades.portal;
                    if !self
                        .pipeline
                        .begin_portal(index, now_ms, &mut self.driver, &mut self.ctx, color)
                    {
                        log::warn!("Transition for fragment {} did not start", index);
                    }
                    self.label_fader.hide();
                }
            }
        }
        self.sync_focus();
    }

    /// Hovering holds only while a fragment is hovered or selected.
    fn sync_focus(&mut self) {
        let focused = self.interaction.hovered().is_some() || self.interaction.selected().is_some();
        self.pipeline.set_focus(focused);
    }

    fn install_mirror(&mut self, result: Result<AssetHandle, AssetError>, platform: &mut Platform) {
        let handle = match result {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!("Mirror model failed to load: {}", err);
                return;
            }
        };
        let resources = vec![
            platform
                .renderer
                .create_resource(ResourceKind::Geometry, &handle.path),
            platform
                .renderer
                .create_resource(ResourceKind::Material, &handle.path),
        ];
        let mut node = Node::new("mirror")
            .with_bounds(Aabb::from_half_extents(MIRROR_HALF_EXTENTS))
            .with_resources(resources);
        node.visible = !self.pipeline.is_broken();
        self.mirror = Some(self.ctx.graph.add_node(node));
    }
}

impl Scene for MirrorScene {
    fn context(&self) -> &SceneContext {
        &self.ctx
    }

    fn start(&mut self, now_ms: f64, platform: &mut Platform) {
        for kind in [
            EventKind::PointerMove,
            EventKind::Click,
            EventKind::Confirm,
            EventKind::Resize,
        ] {
            self.ctx.listen(kind, platform);
        }

        let label = self.ctx.create_dom_node(DomNodeKind::Label, platform);
        platform.dom.set_opacity(label, 0.0);
        self.label = Some(label);
        let button = self.ctx.create_dom_node(DomNodeKind::ContinueButton, platform);
        platform.dom.set_text(button, "Continue");
        platform.dom.set_visible(button, false);
        self.continue_button = Some(button);

        self.mirror_request = Some(
            platform
                .loader
                .request(AssetKind::Model, &platform.config.mirror_model),
        );
        self.ctx
            .registry
            .load_all(&platform.config.fragments, platform.loader.as_mut());
        self.background
            .set_background(None, &platform.config.backgrounds, platform.loader.as_mut());

        self.ctx.start_loop();
        self.last_frame_ms = Some(now_ms);
        log::info!("Mirror scene {:?} running", self.ctx.id);
    }

    fn handle_input(&mut self, event: &InputEvent, now_ms: f64, platform: &mut Platform) {
        if self.ctx.phase != ScenePhase::Running || !self.ctx.is_listening(event.kind(), platform) {
            return;
        }
        match *event {
            InputEvent::PointerMove { x, y } => {
                let hit = self.pick(x, y);
                if self.pipeline.is_broken() {
                    let effects = self.interaction.pointer_moved(hit, &self.ctx.registry);
                    self.apply(effects, now_ms, platform);
                }
            }
            InputEvent::Click { x, y } => {
                if !self.pipeline.is_broken() {
                    self.break_mirror(now_ms);
                    return;
                }
                let hit = self.pick(x, y);
                let effects = self.interaction.clicked(hit, &self.ctx.registry, now_ms);
                self.apply(effects, now_ms, platform);
            }
            InputEvent::Confirm => {
                if !self.pipeline.is_broken() {
                    self.break_mirror(now_ms);
                    return;
                }
                let effects = self.interaction.confirm();
                self.apply(effects, now_ms, platform);
            }
            InputEvent::Resize(viewport) => self.ctx.resize(viewport, platform),
            InputEvent::Wheel { .. } | InputEvent::Back => {}
        }
    }

    fn owns_request(&self, request: RequestId) -> bool {
        self.mirror_request == Some(request)
            || self.ctx.registry.owns_request(request)
            || self.background.owns_request(request)
    }

    fn on_asset(&mut self, completion: AssetCompletion, platform: &mut Platform) {
        let AssetCompletion { request, result } = completion;
        if self.mirror_request == Some(request) {
            self.mirror_request = None;
            self.install_mirror(result, platform);
        } else if self.ctx.registry.owns_request(request) {
            self.ctx.registry.on_model_loaded(
                request,
                result,
                &mut self.ctx.graph,
                platform.renderer.as_mut(),
            );
        } else if self.background.owns_request(request) {
            self.background.on_loaded(
                request,
                result,
                &mut self.ctx.graph,
                platform.renderer.as_mut(),
            );
        }
    }

    fn update(&mut self, now_ms: f64, platform: &mut Platform) -> Option<Handoff> {
        if self.ctx.phase != ScenePhase::Running {
            return None;
        }
        let dt_ms = now_ms - self.last_frame_ms.unwrap_or(now_ms);
        self.last_frame_ms = Some(now_ms);

        let effects = self.interaction.tick(now_ms, &self.ctx.registry);
        self.apply(effects, now_ms, platform);
        self.driver.tick(now_ms, &mut self.ctx);
        let handoff = self
            .pipeline
            .update(now_ms, &mut self.driver, &mut self.ctx);
        self.sync_focus();

        if let Some(label) = self.label {
            let opacity = self.label_fader.step(dt_ms as f32);
            platform.dom.set_opacity(label, opacity);
        }
        self.ctx.sync_overlay(platform);
        self.ctx.registry.sync_graph(&mut self.ctx.graph);
        self.ctx.render(platform);
        handoff
    }

    fn stage(&self) -> TransitionStage {
        self.pipeline.stage()
    }

    fn stop(&mut self) {
        self.driver.cancel_all();
        self.interaction.cancel_auto_select();
        self.ctx.stop_loop();
    }

    fn release(&mut self, platform: &mut Platform) -> TeardownReport {
        let report = self.ctx.release(platform);
        self.background.forget();
        self.mirror = None;
        self.mirror_request = None;
        self.label = None;
        self.continue_button = None;
        report
    }
}
