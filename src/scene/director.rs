//! Scene lifecycle controller.
//!
//! Exactly one scene is active. A switch stops the active scene at once
//! (no further frames), and on the next frame releases everything it
//! installed before the next scene is constructed.

use super::gallery::GalleryScene;
use super::history::NavigationHistory;
use super::mirror::MirrorScene;
use super::{Scene, SceneError, SceneKind, ScenePhase, TeardownReport, TransitionStage};
use crate::platform::{InputEvent, Platform, SceneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SwitchError {
    #[error("a scene switch is already in progress")]
    AlreadySwitching,
}

/// One accepted switch request.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSwitch {
    pub from: SceneKind,
    pub to: SceneKind,
    pub requested_ms: f64,
    /// Fragment index and category key when the switch came from a portal.
    pub origin: Option<(usize, String)>,
}

pub struct SceneDirector {
    platform: Platform,
    active: Option<Box<dyn Scene>>,
    pending: Option<SceneKind>,
    history: NavigationHistory,
    switches: Vec<SceneSwitch>,
    next_scene_id: u64,
    constructed: usize,
    failed_builds: u32,
    seed: Option<u64>,
    last_teardown: Option<TeardownReport>,
}

impl SceneDirector {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            active: None,
            pending: None,
            history: NavigationHistory::new(),
            switches: Vec::new(),
            next_scene_id: 1,
            constructed: 0,
            failed_builds: 0,
            seed: None,
            last_teardown: None,
        }
    }

    /// Seed the auto-select RNG of every mirror scene built from now on.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Construct the first scene.
    pub fn start(&mut self, kind: SceneKind, now_ms: f64) -> Result<(), SceneError> {
        if let Some(active) = &self.active {
            log::warn!("Director already running {}", active.kind());
            return Ok(());
        }
        self.construct(kind, now_ms)
    }

    fn construct(&mut self, kind: SceneKind, now_ms: f64) -> Result<(), SceneError> {
        let id = SceneId(self.next_scene_id);
        self.next_scene_id += 1;
        let mut scene: Box<dyn Scene> = match kind {
            SceneKind::Mirror => Box::new(MirrorScene::new(id, &mut self.platform, self.seed)?),
            SceneKind::Gallery { workshop } => {
                Box::new(GalleryScene::new(id, workshop, &mut self.platform)?)
            }
        };
        scene.start(now_ms, &mut self.platform);
        self.history.push(kind);
        self.constructed += 1;
        self.active = Some(scene);
        log::info!("Constructed {} scene {:?}", kind, id);
        Ok(())
    }

    /// Ask for `target` to replace the active scene. The active scene stops
    /// drawing immediately; teardown and construction happen on the next frame.
    /// With no active scene, `target` is simply built on the next frame.
    pub fn request_switch(&mut self, target: SceneKind, now_ms: f64) -> Result<(), SwitchError> {
        self.begin_switch(target, None, now_ms)
    }

    fn begin_switch(
        &mut self,
        target: SceneKind,
        origin: Option<(usize, String)>,
        now_ms: f64,
    ) -> Result<(), SwitchError> {
        if self.pending.is_some() {
            log::info!("Switch to {} rejected: another switch is in progress", target);
            return Err(SwitchError::AlreadySwitching);
        }
        match self.active.as_mut() {
            Some(scene) => {
                let from = scene.kind();
                scene.stop();
                log::info!("Switching {} -> {}", from, target);
                self.switches.push(SceneSwitch {
                    from,
                    to: target,
                    requested_ms: now_ms,
                    origin,
                });
            }
            None => log::info!("No active scene, {} will be built on the next frame", target),
        }
        self.pending = Some(target);
        Ok(())
    }

    /// One display refresh: finish a pending switch, deliver asset
    /// completions, then update and draw the active scene.
    pub fn frame(&mut self, now_ms: f64) {
        if let Some(target) = self.pending.take() {
            if let Some(mut previous) = self.active.take() {
                let report = previous.release(&mut self.platform);
                log::info!(
                    "Released {} scene: {} listener(s), {} fragment(s), {} resource(s), {} DOM node(s)",
                    previous.kind(),
                    report.listeners,
                    report.fragments,
                    report.resources,
                    report.dom_nodes
                );
                self.last_teardown = Some(report);
            }
            match self.construct(target, now_ms) {
                Ok(()) => self.failed_builds = 0,
                Err(err) => {
                    // Stays pending and is retried every frame until it builds.
                    if self.failed_builds == 0 {
                        log::error!("Could not construct {}: {}", target, err);
                    } else {
                        log::debug!("Retrying {} failed again: {}", target, err);
                    }
                    self.failed_builds = self.failed_builds.saturating_add(1);
                    self.pending = Some(target);
                }
            }
        }

        for completion in self.platform.loader.poll() {
            match self.active.as_mut() {
                Some(scene) if scene.owns_request(completion.request) => {
                    scene.on_asset(completion, &mut self.platform);
                }
                _ => log::debug!("Dropping unclaimed load {:?}", completion.request),
            }
        }

        let handoff = match self.active.as_mut() {
            Some(scene) => scene.update(now_ms, &mut self.platform),
            None => None,
        };
        if let Some(handoff) = handoff {
            if let Err(err) = self.begin_switch(handoff.target, handoff.origin, now_ms) {
                log::warn!("Hand-off to {} dropped: {}", handoff.target, err);
            }
        }
    }

    pub fn handle_input(&mut self, event: InputEvent, now_ms: f64) {
        match event {
            InputEvent::Resize(viewport) => self.platform.viewport = viewport,
            InputEvent::Back if self.history.back_target().is_none() => {
                log::debug!("Nothing to go back to");
                return;
            }
            _ => {}
        }
        if let Some(scene) = self.active.as_mut() {
            scene.handle_input(&event, now_ms, &mut self.platform);
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut Platform {
        &mut self.platform
    }

    pub fn active_scene(&self) -> Option<&dyn Scene> {
        self.active.as_deref()
    }

    pub fn active_kind(&self) -> Option<SceneKind> {
        self.active.as_ref().map(|scene| scene.kind())
    }

    pub fn phase(&self) -> ScenePhase {
        self.active
            .as_ref()
            .map_or(ScenePhase::Uninitialized, |scene| scene.phase())
    }

    pub fn stage(&self) -> Option<TransitionStage> {
        self.active.as_ref().map(|scene| scene.stage())
    }

    pub fn is_switching(&self) -> bool {
        self.pending.is_some()
    }

    pub fn switches(&self) -> &[SceneSwitch] {
        &self.switches
    }

    pub fn constructed_count(&self) -> usize {
        self.constructed
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn last_teardown(&self) -> Option<TeardownReport> {
        self.last_teardown
    }
}
