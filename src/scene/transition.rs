//! Timed choreography for fragments: hover-forward and levitation, the break
//! pop-in, and the fall / rush / portal-enter chain that ends in a scene
//! hand-off. Every stage is a step on the scene's [`AnimationDriver`]; the
//! pipeline only watches the stage token and chains the next stage when it
//! finishes.

use super::{Handoff, SceneContext, SceneKind};
use crate::anim::easing::{ease_cubic_in_out, ease_cubic_out, ease_quad_in};
use crate::anim::{lerp, lerp_vec3, progress, AnimationDriver, AnimationOwner, AnimationToken};
use glam::Vec3;

pub const HOVER_FORWARD_MS: f64 = 1_500.0;
pub const HOVER_FORWARD_DISTANCE: f32 = 10.0;
pub const LEVITATION_PERIOD_MS: f64 = 3_000.0;
pub const LEVITATION_AMPLITUDE: f32 = 0.7;
pub const RESET_MS: f64 = 800.0;

pub const BREAK_MS: f64 = 500.0;
/// Fragments ignore the pointer until the pop-in has settled.
pub const CLICKABLE_DELAY_MS: f64 = 600.0;

pub const FALL_MS: f64 = 1_500.0;
pub const FALL_DROP: f32 = 15.0;
pub const FALL_PUSH: f32 = 5.0;
pub const DIMMED_OPACITY: f32 = 0.5;

pub const RUSH_MS: f64 = 1_200.0;
pub const RUSH_SCALE: f32 = 3.0;

pub const PORTAL_MS: f64 = 2_000.0;
pub const PORTAL_CAMERA_ADVANCE: f32 = 5.0;
pub const PORTAL_SCALE: f32 = 50.0;

pub const FADE_OUT_MS: f64 = 800.0;

type Driver = AnimationDriver<SceneContext>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionStage {
    Idle,
    Breaking,
    Hovering,
    Falling,
    Rushing,
    Entering,
    FadingOut,
    Disposed,
}

impl TransitionStage {
    fn rank(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Breaking => 1,
            Self::Hovering => 2,
            Self::Falling => 3,
            Self::Rushing => 4,
            Self::Entering => 5,
            Self::FadingOut => 6,
            Self::Disposed => 7,
        }
    }

    /// Stages only move forward, except settling back to idle after the
    /// break or when hover focus is lost.
    pub fn can_advance_to(self, next: TransitionStage) -> bool {
        matches!(
            (self, next),
            (Self::Breaking, Self::Idle) | (Self::Hovering, Self::Idle)
        ) || next.rank() > self.rank()
    }

    /// True while a scene-leaving transition owns the scene.
    pub fn is_leaving(self) -> bool {
        matches!(
            self,
            Self::Falling | Self::Rushing | Self::Entering | Self::FadingOut | Self::Disposed
        )
    }
}

#[derive(Debug, Clone)]
struct Subject {
    index: usize,
    category_key: String,
    base_scale: f32,
}

#[derive(Debug)]
pub struct TransitionPipeline {
    stage: TransitionStage,
    history: Vec<TransitionStage>,
    broken: bool,
    subject: Option<Subject>,
    current: Option<AnimationToken>,
    target: Option<SceneKind>,
}

impl Default for TransitionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionPipeline {
    pub fn new() -> Self {
        Self {
            stage: TransitionStage::Idle,
            history: vec![TransitionStage::Idle],
            broken: false,
            subject: None,
            current: None,
            target: None,
        }
    }

    pub fn stage(&self) -> TransitionStage {
        self.stage
    }

    /// Every stage entered so far, starting with `Idle`. A hover that ended
    /// without a transition is folded away, so idle browsing does not grow it.
    pub fn history(&self) -> &[TransitionStage] {
        &self.history
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn subject(&self) -> Option<usize> {
        self.subject.as_ref().map(|subject| subject.index)
    }

    fn advance(&mut self, next: TransitionStage) -> bool {
        if !self.stage.can_advance_to(next) {
            log::warn!("Ignoring stage change {:?} -> {:?}", self.stage, next);
            return false;
        }
        log::info!("Transition stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
        let len = self.history.len();
        let hover_ended = next == TransitionStage::Idle
            && len >= 2
            && self.history[len - 2..] == [TransitionStage::Idle, TransitionStage::Hovering];
        if hover_ended {
            self.history.pop();
        } else {
            self.history.push(next);
        }
        true
    }

    /// Shatter the mirror: reveal fragments with a pop-in, make them
    /// clickable shortly after. A second call is a no-op.
    pub fn begin_break(&mut self, now_ms: f64, driver: &mut Driver, ctx: &mut SceneContext) -> bool {
        if self.broken || self.stage != TransitionStage::Idle {
            return false;
        }
        self.broken = true;
        self.advance(TransitionStage::Breaking);
        ctx.registry.set_visible(true);

        for index in ctx.registry.indices() {
            let Some(entity) = ctx.registry.get_mut(index) else {
                continue;
            };
            let full = entity.transform.scale;
            entity.transform.scale = Vec3::ZERO;
            driver.run_owned(
                AnimationOwner::Entity(index),
                now_ms,
                Box::new(move |elapsed: f64, ctx: &mut SceneContext| {
                    let t = ease_cubic_out(progress(elapsed, BREAK_MS));
                    if let Some(entity) = ctx.registry.get_mut(index) {
                        entity.transform.scale = lerp_vec3(Vec3::ZERO, full, t);
                    }
                    t < 1.0
                }),
            );
        }

        driver.run(
            now_ms,
            Box::new(|elapsed: f64, ctx: &mut SceneContext| {
                if elapsed < CLICKABLE_DELAY_MS {
                    return true;
                }
                ctx.registry.set_clickable(true);
                false
            }),
        );
        self.current = Some(driver.run(
            now_ms,
            Box::new(|elapsed: f64, _: &mut SceneContext| elapsed < BREAK_MS),
        ));
        true
    }

    /// Track whether any fragment is hovered or selected.
    pub fn set_focus(&mut self, focused: bool) {
        match (self.stage, focused) {
            (TransitionStage::Idle, true) if self.broken => {
                self.advance(TransitionStage::Hovering);
            }
            (TransitionStage::Hovering, false) => {
                self.advance(TransitionStage::Idle);
            }
            _ => {}
        }
    }

    /// Start the fall of fragment `index`; the rest of the chain follows in
    /// [`update`](Self::update). Rejected while another transition runs.
    pub fn begin_portal(
        &mut self,
        index: usize,
        now_ms: f64,
        driver: &mut Driver,
        ctx: &mut SceneContext,
        color: [f32; 3],
    ) -> bool {
        let settled = self.broken && self.stage != TransitionStage::Breaking;
        if !settled || self.stage.is_leaving() {
            log::debug!("Portal for fragment {} rejected in {:?}", index, self.stage);
            return false;
        }
        let Some(entity) = ctx.registry.get(index) else {
            log::warn!("Portal requested for missing fragment {}", index);
            return false;
        };
        let subject = Subject {
            index,
            category_key: entity.category_key.clone(),
            base_scale: ctx.layout.fragment_scale(),
        };
        let from = entity.transform.position;
        let to = from + Vec3::new(0.0, -FALL_DROP, FALL_PUSH);

        self.current = None;
        self.advance(TransitionStage::Falling);
        ctx.registry.set_clickable(false);
        for entity in ctx.registry.all_mut() {
            if entity.index != index {
                entity.opacity = DIMMED_OPACITY;
            }
        }
        ctx.overlay.color = color;
        self.target = Some(SceneKind::Gallery { workshop: index });
        self.subject = Some(subject);

        self.current = Some(driver.run_owned(
            AnimationOwner::Entity(index),
            now_ms,
            Box::new(move |elapsed: f64, ctx: &mut SceneContext| {
                let t = ease_cubic_out(progress(elapsed, FALL_MS));
                if let Some(entity) = ctx.registry.get_mut(index) {
                    entity.transform.position = lerp_vec3(from, to, t);
                }
                t < 1.0
            }),
        ));
        true
    }

    /// Fade the overlay to `color` and leave for `target`.
    pub fn begin_fade_out(
        &mut self,
        target: SceneKind,
        now_ms: f64,
        driver: &mut Driver,
        ctx: &mut SceneContext,
        color: [f32; 3],
    ) -> bool {
        if self.stage.is_leaving() {
            return false;
        }
        self.advance(TransitionStage::FadingOut);
        self.target = Some(target);
        ctx.registry.set_clickable(false);
        ctx.overlay.color = color;
        let from = ctx.overlay.opacity;
        self.current = Some(driver.run_owned(
            AnimationOwner::Overlay,
            now_ms,
            Box::new(move |elapsed: f64, ctx: &mut SceneContext| {
                let t = progress(elapsed, FADE_OUT_MS);
                ctx.overlay.opacity = lerp(from, 1.0, t);
                t < 1.0
            }),
        ));
        true
    }

    /// Chain the next stage once the current one has finished.
    pub fn update(
        &mut self,
        now_ms: f64,
        driver: &mut Driver,
        ctx: &mut SceneContext,
    ) -> Option<Handoff> {
        let token = self.current?;
        if driver.is_running(token) {
            return None;
        }
        self.current = None;

        match self.stage {
            TransitionStage::Breaking => {
                self.advance(TransitionStage::Idle);
                None
            }
            TransitionStage::Falling => {
                self.start_rush(now_ms, driver, ctx);
                None
            }
            TransitionStage::Rushing => {
                self.start_enter(now_ms, driver, ctx);
                None
            }
            TransitionStage::Entering | TransitionStage::FadingOut => {
                if ctx.overlay.opacity < 1.0 {
                    log::warn!("Stage ended with overlay at {:.3}", ctx.overlay.opacity);
                    ctx.overlay.opacity = 1.0;
                }
                self.advance(TransitionStage::Disposed);
                let target = self.target.take()?;
                Some(Handoff {
                    target,
                    origin: self
                        .subject
                        .as_ref()
                        .map(|subject| (subject.index, subject.category_key.clone())),
                })
            }
            _ => None,
        }
    }

    fn start_rush(&mut self, now_ms: f64, driver: &mut Driver, ctx: &mut SceneContext) {
        let Some(subject) = self.subject.clone() else {
            return;
        };
        self.advance(TransitionStage::Rushing);
        let index = subject.index;
        let target = ctx.camera.point_in_front(ctx.layout.rush_distance());
        let target_scale = Vec3::splat(subject.base_scale * RUSH_SCALE);
        let start = ctx.registry.get(index).map(|entity| entity.transform);

        self.current = Some(driver.run_owned(
            AnimationOwner::Entity(index),
            now_ms,
            Box::new(move |elapsed: f64, ctx: &mut SceneContext| {
                let t = ease_cubic_in_out(progress(elapsed, RUSH_MS));
                if let (Some(start), Some(entity)) = (start, ctx.registry.get_mut(index)) {
                    entity.transform.position = lerp_vec3(start.position, target, t);
                    entity.transform.rotation = lerp_vec3(start.rotation, Vec3::ZERO, t);
                    entity.transform.scale = lerp_vec3(start.scale, target_scale, t);
                }
                t < 1.0
            }),
        ));
    }

    fn start_enter(&mut self, now_ms: f64, driver: &mut Driver, ctx: &mut SceneContext) {
        let Some(subject) = self.subject.clone() else {
            return;
        };
        self.advance(TransitionStage::Entering);
        let index = subject.index;
        let camera_from = ctx.camera.position;
        let camera_to = ctx.camera.point_in_front(PORTAL_CAMERA_ADVANCE);
        let portal = ctx.camera.point_in_front(ctx.layout.portal_distance());
        let scale_from = match ctx.registry.get_mut(index) {
            Some(entity) => {
                entity.transform.position = portal;
                entity.transform.scale
            }
            None => Vec3::splat(subject.base_scale),
        };
        let scale_to = Vec3::splat(subject.base_scale * PORTAL_SCALE);

        driver.cancel_owner(AnimationOwner::Camera);
        driver.cancel_owner(AnimationOwner::Overlay);
        self.current = Some(driver.run_owned(
            AnimationOwner::Entity(index),
            now_ms,
            Box::new(move |elapsed: f64, ctx: &mut SceneContext| {
                let t = progress(elapsed, PORTAL_MS);
                let eased = ease_quad_in(t);
                ctx.camera.position = lerp_vec3(camera_from, camera_to, eased);
                if let Some(entity) = ctx.registry.get_mut(index) {
                    entity.transform.scale = lerp_vec3(scale_from, scale_to, eased);
                }
                ctx.overlay.opacity = eased;
                t < 1.0
            }),
        ));
    }
}

/// Move a fragment toward the viewer, then levitate it until another
/// animation takes the fragment over.
pub fn start_hover_forward(
    index: usize,
    now_ms: f64,
    driver: &mut Driver,
    ctx: &mut SceneContext,
) -> Option<AnimationToken> {
    let entity = ctx.registry.get_mut(index)?;
    let original = entity.capture_original();
    let start = entity.transform.position;
    let target_z = original.z + HOVER_FORWARD_DISTANCE;

    Some(driver.run_owned(
        AnimationOwner::Entity(index),
        now_ms,
        Box::new(move |elapsed: f64, ctx: &mut SceneContext| {
            let Some(entity) = ctx.registry.get_mut(index) else {
                return false;
            };
            if elapsed < HOVER_FORWARD_MS {
                let t = progress(elapsed, HOVER_FORWARD_MS);
                entity.transform.position.z = lerp(start.z, target_z, t);
                entity.transform.position.y = lerp(start.y, original.y, t);
            } else {
                entity.transform.position.z = target_z;
                entity.transform.position.y =
                    levitation_y(original.y, elapsed - HOVER_FORWARD_MS);
            }
            true
        }),
    ))
}

/// Ease a fragment back to its captured resting transform.
pub fn start_reset(
    index: usize,
    now_ms: f64,
    driver: &mut Driver,
    ctx: &mut SceneContext,
) -> Option<AnimationToken> {
    let entity = ctx.registry.get(index)?;
    let Some(original) = entity.original() else {
        driver.cancel_owner(AnimationOwner::Entity(index));
        return None;
    };
    let start = entity.transform.position;

    Some(driver.run_owned(
        AnimationOwner::Entity(index),
        now_ms,
        Box::new(move |elapsed: f64, ctx: &mut SceneContext| {
            let t = ease_cubic_out(progress(elapsed, RESET_MS));
            if let Some(entity) = ctx.registry.get_mut(index) {
                entity.transform.position.y = lerp(start.y, original.y, t);
                entity.transform.position.z = lerp(start.z, original.z, t);
            }
            t < 1.0
        }),
    ))
}

pub fn levitation_y(original_y: f32, elapsed_ms: f64) -> f32 {
    let phase = (elapsed_ms % LEVITATION_PERIOD_MS) / LEVITATION_PERIOD_MS;
    original_y + (std::f64::consts::TAU * phase).sin() as f32 * LEVITATION_AMPLITUDE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ContentLibrary;
    use crate::config::{ExperienceConfig, FragmentConfig};
    use crate::platform::headless::{HeadlessDom, HeadlessRenderer, ScriptedLoader};
    use crate::platform::{Platform, SceneId};
    use crate::render::Viewport;
    use crate::scene::registry::OriginalTransform;
    use approx::assert_relative_eq;

    const FRAME_MS: f64 = 16.0;

    fn scene(keys: &[&str]) -> (SceneContext, Platform) {
        let mut platform = Platform::new(
            Box::new(HeadlessRenderer::new()),
            Box::new(HeadlessDom::new()),
            Box::new(ScriptedLoader::new()),
            ExperienceConfig::default(),
            ContentLibrary::new(),
            Viewport::new(1280, 720),
        );
        let mut ctx = SceneContext::new(SceneId(1), SceneKind::Mirror, &mut platform).unwrap();
        let fragments: Vec<FragmentConfig> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| FragmentConfig {
                category_key: key.to_string(),
                model: format!("{i}.glb"),
                display_name: None,
            })
            .collect();
        ctx.registry.load_all(&fragments, platform.loader.as_mut());
        for done in platform.loader.poll() {
            ctx.registry.on_model_loaded(
                done.request,
                done.result,
                &mut ctx.graph,
                platform.renderer.as_mut(),
            );
        }
        (ctx, platform)
    }

    fn run_until(
        pipeline: &mut TransitionPipeline,
        driver: &mut Driver,
        ctx: &mut SceneContext,
        from_ms: f64,
        until_ms: f64,
        mut each: impl FnMut(&SceneContext, Option<&Handoff>),
    ) -> Vec<Handoff> {
        let mut handoffs = Vec::new();
        let mut now = from_ms;
        while now <= until_ms {
            driver.tick(now, ctx);
            let handoff = pipeline.update(now, driver, ctx);
            each(ctx, handoff.as_ref());
            handoffs.extend(handoff);
            now += FRAME_MS;
        }
        handoffs
    }

    #[test]
    fn stage_order_only_moves_forward() {
        use TransitionStage::*;
        assert!(Idle.can_advance_to(Breaking));
        assert!(Hovering.can_advance_to(Idle));
        assert!(Breaking.can_advance_to(Idle));
        assert!(Entering.can_advance_to(Disposed));
        assert!(!Falling.can_advance_to(Hovering));
        assert!(!Disposed.can_advance_to(Idle));
        assert!(!Rushing.can_advance_to(Rushing));
    }

    #[test]
    fn hover_forward_lands_exactly_then_levitates() {
        let (mut ctx, _platform) = scene(&["A", "B", "C"]);
        let mut driver = Driver::new();
        let z0 = ctx.registry.get(1).unwrap().transform.position.z;
        let y0 = ctx.registry.get(1).unwrap().transform.position.y;

        start_hover_forward(1, 1_000.0, &mut driver, &mut ctx).unwrap();
        driver.tick(1_750.0, &mut ctx);
        let mid = ctx.registry.get(1).unwrap().transform.position.z;
        assert!(mid > z0 && mid < z0 + 10.0);

        driver.tick(2_500.0, &mut ctx);
        assert_eq!(ctx.registry.get(1).unwrap().transform.position.z, z0 + 10.0);

        driver.tick(2_500.0 + 750.0, &mut ctx);
        let entity = ctx.registry.get(1).unwrap();
        assert_relative_eq!(entity.transform.position.y, y0 + 0.7, epsilon = 1e-4);
        assert_eq!(entity.original().unwrap().z, z0);
    }

    #[test]
    fn reset_returns_to_original() {
        let (mut ctx, _platform) = scene(&["A"]);
        let mut driver = Driver::new();
        let rest = ctx.registry.get(0).unwrap().transform.position;
        start_hover_forward(0, 0.0, &mut driver, &mut ctx);
        driver.tick(900.0, &mut ctx);
        start_reset(0, 900.0, &mut driver, &mut ctx).unwrap();
        driver.tick(900.0 + RESET_MS, &mut ctx);
        assert_eq!(ctx.registry.get(0).unwrap().transform.position, rest);
        assert_eq!(driver.active_count(), 0);
    }

    #[test]
    fn reset_without_capture_only_cancels() {
        let (mut ctx, _platform) = scene(&["A"]);
        let mut driver = Driver::new();
        assert!(start_reset(0, 0.0, &mut driver, &mut ctx).is_none());
    }

    #[test]
    fn break_reveals_then_enables_clicks() {
        let (mut ctx, _platform) = scene(&["A", "B"]);
        let mut driver = Driver::new();
        let mut pipeline = TransitionPipeline::new();
        assert!(pipeline.begin_break(0.0, &mut driver, &mut ctx));
        assert!(!pipeline.begin_break(10.0, &mut driver, &mut ctx));
        assert!(ctx.registry.all().all(|e| e.visible && !e.is_clickable));

        run_until(&mut pipeline, &mut driver, &mut ctx, 0.0, 640.0, |_, _| {});
        assert_eq!(pipeline.stage(), TransitionStage::Idle);
        assert!(ctx.registry.all().all(|e| e.is_clickable));
        let scale = ctx.layout.fragment_scale();
        assert!(ctx
            .registry
            .all()
            .all(|e| e.transform.scale == Vec3::splat(scale)));
    }

    #[test]
    fn portal_chain_hands_off_once_at_full_overlay() {
        let (mut ctx, _platform) = scene(&["A", "B", "C"]);
        let mut driver = Driver::new();
        let mut pipeline = TransitionPipeline::new();
        pipeline.begin_break(0.0, &mut driver, &mut ctx);
        run_until(&mut pipeline, &mut driver, &mut ctx, 0.0, 1_000.0, |_, _| {});

        assert!(pipeline.begin_portal(0, 1_000.0, &mut driver, &mut ctx, [1.0; 3]));
        assert!(!pipeline.begin_portal(1, 1_001.0, &mut driver, &mut ctx, [1.0; 3]));
        assert!(ctx.registry.all().all(|e| !e.is_clickable));
        assert_eq!(ctx.registry.get(2).unwrap().opacity, DIMMED_OPACITY);

        let mut last_opacity = 0.0;
        let camera_z = ctx.camera.position.z;
        let handoffs = run_until(
            &mut pipeline,
            &mut driver,
            &mut ctx,
            1_000.0,
            8_000.0,
            |ctx, handoff| {
                assert!(ctx.overlay.opacity >= last_opacity);
                last_opacity = ctx.overlay.opacity;
                if handoff.is_some() {
                    assert_eq!(ctx.overlay.opacity, 1.0);
                }
            },
        );

        assert_eq!(
            handoffs,
            vec![Handoff {
                target: SceneKind::Gallery { workshop: 0 },
                origin: Some((0, "A".to_string())),
            }]
        );
        let tail: Vec<_> = pipeline
            .history()
            .iter()
            .skip_while(|stage| **stage != TransitionStage::Falling)
            .copied()
            .collect();
        assert_eq!(
            tail,
            vec![
                TransitionStage::Falling,
                TransitionStage::Rushing,
                TransitionStage::Entering,
                TransitionStage::Disposed,
            ]
        );
        assert_relative_eq!(
            ctx.camera.position.z,
            camera_z - PORTAL_CAMERA_ADVANCE,
            epsilon = 1e-4
        );
        assert_relative_eq!(
            ctx.registry.get(0).unwrap().transform.scale.x,
            PORTAL_SCALE * ctx.layout.fragment_scale(),
            epsilon = 1e-3
        );
    }

    #[test]
    fn focus_toggles_settle_after_break_and_stay_out_of_history() {
        let (mut ctx, _platform) = scene(&["A", "B"]);
        let mut driver = Driver::new();
        let mut pipeline = TransitionPipeline::new();
        pipeline.set_focus(true);
        assert_eq!(pipeline.stage(), TransitionStage::Idle);

        pipeline.begin_break(0.0, &mut driver, &mut ctx);
        pipeline.set_focus(true);
        assert_eq!(pipeline.stage(), TransitionStage::Breaking);
        run_until(&mut pipeline, &mut driver, &mut ctx, 0.0, 640.0, |_, _| {});
        assert_eq!(pipeline.stage(), TransitionStage::Idle);

        for _ in 0..50 {
            pipeline.set_focus(true);
            assert_eq!(pipeline.stage(), TransitionStage::Hovering);
            pipeline.set_focus(false);
            assert_eq!(pipeline.stage(), TransitionStage::Idle);
        }
        use TransitionStage::*;
        assert_eq!(pipeline.history(), &[Idle, Breaking, Idle]);

        pipeline.set_focus(true);
        assert_eq!(pipeline.history(), &[Idle, Breaking, Idle, Hovering]);
    }

    #[test]
    fn original_survives_every_leaving_stage() {
        let (mut ctx, _platform) = scene(&["A", "B", "C"]);
        let mut driver = Driver::new();
        let mut pipeline = TransitionPipeline::new();
        pipeline.begin_break(0.0, &mut driver, &mut ctx);
        run_until(&mut pipeline, &mut driver, &mut ctx, 0.0, 1_000.0, |_, _| {});

        let rest = ctx.registry.get(1).unwrap().transform.position;
        start_hover_forward(1, 1_000.0, &mut driver, &mut ctx).unwrap();
        pipeline.set_focus(true);
        driver.tick(2_600.0, &mut ctx);
        let original = ctx.registry.get(1).unwrap().original().unwrap();
        assert_eq!(original, OriginalTransform { y: rest.y, z: rest.z });

        assert!(pipeline.begin_portal(1, 2_600.0, &mut driver, &mut ctx, [1.0; 3]));
        let handoffs = run_until(
            &mut pipeline,
            &mut driver,
            &mut ctx,
            2_600.0,
            9_000.0,
            |ctx, _| {
                assert_eq!(ctx.registry.get(1).unwrap().original(), Some(original));
            },
        );
        assert_eq!(handoffs.len(), 1);
        let tail: Vec<_> = pipeline
            .history()
            .iter()
            .skip_while(|stage| **stage != TransitionStage::Falling)
            .copied()
            .collect();
        assert_eq!(
            tail,
            vec![
                TransitionStage::Falling,
                TransitionStage::Rushing,
                TransitionStage::Entering,
                TransitionStage::Disposed,
            ]
        );
        assert_eq!(ctx.registry.get(1).unwrap().original(), Some(original));
    }

    #[test]
    fn portal_needs_a_broken_mirror() {
        let (mut ctx, _platform) = scene(&["A"]);
        let mut driver = Driver::new();
        let mut pipeline = TransitionPipeline::new();
        assert!(!pipeline.begin_portal(0, 0.0, &mut driver, &mut ctx, [1.0; 3]));
        assert_eq!(pipeline.stage(), TransitionStage::Idle);
    }

    #[test]
    fn fade_out_leaves_for_target() {
        let (mut ctx, _platform) = scene(&[]);
        let mut driver = Driver::new();
        let mut pipeline = TransitionPipeline::new();
        assert!(pipeline.begin_fade_out(SceneKind::Mirror, 0.0, &mut driver, &mut ctx, [0.0; 3]));
        assert!(!pipeline.begin_fade_out(SceneKind::Mirror, 5.0, &mut driver, &mut ctx, [0.0; 3]));

        let handoffs = run_until(&mut pipeline, &mut driver, &mut ctx, 0.0, 1_000.0, |_, _| {});
        assert_eq!(handoffs.len(), 1);
        assert_eq!(handoffs[0].target, SceneKind::Mirror);
        assert_eq!(handoffs[0].origin, None);
        assert_eq!(ctx.overlay.color, [0.0; 3]);
        assert_eq!(pipeline.stage(), TransitionStage::Disposed);
    }

    #[test]
    fn levitation_is_periodic() {
        assert_relative_eq!(levitation_y(2.0, 0.0), 2.0);
        assert_relative_eq!(levitation_y(2.0, 750.0), 2.7, epsilon = 1e-5);
        assert_relative_eq!(levitation_y(2.0, 3_750.0), 2.7, epsilon = 1e-5);
    }
}
