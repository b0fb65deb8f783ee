//! Hover / select / auto-select state machine for the mirror fragments.
//!
//! The machine never touches transforms or collaborators directly. Each
//! input returns the effects the owning scene must carry out, in order.

use super::registry::FragmentRegistry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Delay before a random fragment is picked when nothing is selected.
pub const AUTO_SELECT_DELAY_MS: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEffect {
    /// Animate the fragment back to its captured original transform.
    ResetFocus(usize),
    /// Start hover-forward (then levitation) on the fragment.
    FocusForward(usize),
    /// Show the label for a fragment, or hide it.
    ShowLabel(Option<usize>),
    /// Swap the background to the fragment's category, or back to the default.
    SetBackground(Option<usize>),
    ShowContinue(bool),
    /// Hand the fragment to the transition pipeline.
    BeginTransition(usize),
}

use InteractionEffect::*;

#[derive(Debug)]
pub struct InteractionState {
    hovered: Option<usize>,
    selected: Option<usize>,
    previously_selected: Option<usize>,
    user_has_interacted: bool,
    transition: Option<usize>,
    auto_select_at: Option<f64>,
    rng: StdRng,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl InteractionState {
    pub fn new(rng: StdRng) -> Self {
        Self {
            hovered: None,
            selected: None,
            previously_selected: None,
            user_has_interacted: false,
            transition: None,
            auto_select_at: None,
            rng,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn user_has_interacted(&self) -> bool {
        self.user_has_interacted
    }

    pub fn is_animating_transition(&self) -> bool {
        self.transition.is_some()
    }

    pub fn transitioning(&self) -> Option<usize> {
        self.transition
    }

    pub fn auto_select_deadline(&self) -> Option<f64> {
        self.auto_select_at
    }

    /// Arm the auto-select timer unless the user already took over.
    pub fn arm_auto_select(&mut self, now_ms: f64) {
        if self.user_has_interacted || self.transition.is_some() {
            return;
        }
        self.auto_select_at = Some(now_ms + AUTO_SELECT_DELAY_MS);
    }

    pub fn cancel_auto_select(&mut self) {
        self.auto_select_at = None;
    }

    pub fn pointer_moved(
        &mut self,
        hit: Option<usize>,
        registry: &FragmentRegistry,
    ) -> Vec<InteractionEffect> {
        if self.transition.is_some() {
            return Vec::new();
        }
        let hit = hit.filter(|index| registry.get(*index).is_some_and(|e| e.is_hoverable));
        let mut effects = Vec::new();

        match hit {
            Some(index) if Some(index) == self.hovered => {}
            Some(index) if Some(index) == self.selected => {
                if let Some(previous) = self.hovered.take() {
                    effects.push(ResetFocus(previous));
                }
                self.hovered = Some(index);
            }
            Some(index) => {
                if let Some(previous) = self.hovered {
                    if Some(previous) != self.selected {
                        effects.push(ResetFocus(previous));
                    }
                }
                self.hovered = Some(index);
                effects.push(FocusForward(index));
                if self.selected.is_none() {
                    effects.push(ShowLabel(Some(index)));
                    effects.push(SetBackground(Some(index)));
                }
            }
            None => {
                let Some(previous) = self.hovered else {
                    return effects;
                };
                if Some(previous) == self.selected {
                    return effects;
                }
                effects.push(ResetFocus(previous));
                self.hovered = None;
                if self.selected.is_none() {
                    effects.push(ShowLabel(None));
                    effects.push(SetBackground(None));
                }
            }
        }
        effects
    }

    pub fn clicked(
        &mut self,
        hit: Option<usize>,
        registry: &FragmentRegistry,
        now_ms: f64,
    ) -> Vec<InteractionEffect> {
        if self.transition.is_some() {
            return Vec::new();
        }
        match hit {
            None => self.deselect(now_ms),
            Some(index) => {
                let clickable = registry.get(index).is_some_and(|e| e.is_clickable);
                if !clickable {
                    return Vec::new();
                }
                self.user_has_interacted = true;
                self.auto_select_at = None;
                if self.selected == Some(index) {
                    return Vec::new();
                }
                self.select(index)
            }
        }
    }

    /// Start the transition for the selected fragment.
    pub fn confirm(&mut self) -> Vec<InteractionEffect> {
        if self.transition.is_some() {
            return Vec::new();
        }
        let Some(index) = self.selected else {
            return Vec::new();
        };
        self.transition = Some(index);
        self.auto_select_at = None;
        vec![ShowContinue(false), BeginTransition(index)]
    }

    /// Fire the auto-select timer if it is due.
    pub fn tick(&mut self, now_ms: f64, registry: &FragmentRegistry) -> Vec<InteractionEffect> {
        let Some(deadline) = self.auto_select_at else {
            return Vec::new();
        };
        if now_ms < deadline || self.transition.is_some() {
            return Vec::new();
        }
        self.auto_select_at = None;
        if self.user_has_interacted {
            return Vec::new();
        }

        let clickable: Vec<usize> = registry
            .all()
            .filter(|entity| entity.is_clickable)
            .map(|entity| entity.index)
            .collect();
        let exclude = self.selected.or(self.previously_selected);
        let mut candidates: Vec<usize> = clickable
            .iter()
            .copied()
            .filter(|index| Some(*index) != exclude)
            .collect();
        if candidates.is_empty() {
            candidates = clickable
                .into_iter()
                .filter(|index| Some(*index) != self.selected)
                .collect();
        }

        let mut effects = Vec::new();
        if !candidates.is_empty() {
            let pick = candidates[self.rng.random_range(0..candidates.len())];
            log::debug!("Auto-selecting fragment {}", pick);
            effects = self.select(pick);
        }
        self.auto_select_at = Some(now_ms + AUTO_SELECT_DELAY_MS);
        effects
    }

    fn select(&mut self, index: usize) -> Vec<InteractionEffect> {
        let mut effects = Vec::new();
        if let Some(previous) = self.selected.take() {
            effects.push(ResetFocus(previous));
            self.previously_selected = Some(previous);
            if self.hovered == Some(previous) {
                self.hovered = None;
            }
        }
        let already_forward = self.hovered == Some(index);
        if let Some(hovered) = self.hovered {
            if hovered != index {
                effects.push(ResetFocus(hovered));
                self.hovered = None;
            }
        }
        self.selected = Some(index);
        if !already_forward {
            effects.push(FocusForward(index));
        }
        effects.push(ShowContinue(true));
        effects.push(ShowLabel(Some(index)));
        effects.push(SetBackground(Some(index)));
        effects
    }

    fn deselect(&mut self, now_ms: f64) -> Vec<InteractionEffect> {
        let Some(previous) = self.selected.take() else {
            return Vec::new();
        };
        self.previously_selected = Some(previous);
        if self.hovered == Some(previous) {
            self.hovered = None;
        }
        self.user_has_interacted = false;
        self.auto_select_at = Some(now_ms + AUTO_SELECT_DELAY_MS);
        vec![
            ResetFocus(previous),
            ShowContinue(false),
            ShowLabel(None),
            SetBackground(None),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FragmentConfig;
    use crate::platform::headless::{HeadlessRenderer, ScriptedLoader};
    use crate::render::SceneGraph;
    use crate::scene::layout::LayoutProfile;
    use crate::assets::AssetLoader;

    fn registry(count: usize) -> FragmentRegistry {
        let configs: Vec<FragmentConfig> = (0..count)
            .map(|i| FragmentConfig {
                category_key: format!("K{i}"),
                model: format!("m{i}.glb"),
                display_name: None,
            })
            .collect();
        let mut registry = FragmentRegistry::new(LayoutProfile::Desktop);
        let mut loader = ScriptedLoader::new();
        let mut graph = SceneGraph::new();
        let mut renderer = HeadlessRenderer::new();
        registry.load_all(&configs, &mut loader);
        for done in loader.poll() {
            registry.on_model_loaded(done.request, done.result, &mut graph, &mut renderer);
        }
        registry.set_visible(true);
        registry.set_clickable(true);
        registry
    }

    #[test]
    fn hover_moves_focus_between_fragments() {
        let registry = registry(3);
        let mut state = InteractionState::with_seed(1);
        assert_eq!(
            state.pointer_moved(Some(1), &registry),
            vec![FocusForward(1), ShowLabel(Some(1)), SetBackground(Some(1))]
        );
        assert_eq!(state.pointer_moved(Some(1), &registry), vec![]);
        assert_eq!(
            state.pointer_moved(Some(2), &registry),
            vec![ResetFocus(1), FocusForward(2), ShowLabel(Some(2)), SetBackground(Some(2))]
        );
        assert_eq!(
            state.pointer_moved(None, &registry),
            vec![ResetFocus(2), ShowLabel(None), SetBackground(None)]
        );
        assert_eq!(state.hovered(), None);
    }

    #[test]
    fn hover_keeps_selected_label_and_background() {
        let registry = registry(3);
        let mut state = InteractionState::with_seed(1);
        state.clicked(Some(0), &registry, 0.0);
        assert_eq!(state.pointer_moved(Some(2), &registry), vec![FocusForward(2)]);
        assert_eq!(state.pointer_moved(None, &registry), vec![ResetFocus(2)]);
        assert_eq!(state.selected(), Some(0));
    }

    #[test]
    fn unhoverable_fragments_are_ignored() {
        let mut registry = registry(2);
        registry.set_clickable(false);
        let mut state = InteractionState::with_seed(1);
        assert!(state.pointer_moved(Some(0), &registry).is_empty());
        assert!(state.clicked(Some(0), &registry, 0.0).is_empty());
        assert!(!state.user_has_interacted());
    }

    #[test]
    fn click_selects_and_reselect_is_noop() {
        let registry = registry(3);
        let mut state = InteractionState::with_seed(1);
        state.pointer_moved(Some(1), &registry);
        assert_eq!(
            state.clicked(Some(1), &registry, 0.0),
            vec![ShowContinue(true), ShowLabel(Some(1)), SetBackground(Some(1))]
        );
        assert!(state.user_has_interacted());
        assert!(state.clicked(Some(1), &registry, 10.0).is_empty());

        let effects = state.clicked(Some(2), &registry, 20.0);
        assert_eq!(effects[0], ResetFocus(1));
        assert!(effects.contains(&FocusForward(2)));
        assert_eq!(state.selected(), Some(2));
    }

    #[test]
    fn click_on_empty_deselects_and_arms_timer() {
        let registry = registry(3);
        let mut state = InteractionState::with_seed(1);
        state.clicked(Some(0), &registry, 0.0);
        let effects = state.clicked(None, &registry, 500.0);
        assert_eq!(effects[0], ResetFocus(0));
        assert!(effects.contains(&ShowContinue(false)));
        assert_eq!(state.selected(), None);
        assert!(!state.user_has_interacted());
        assert_eq!(state.auto_select_deadline(), Some(10_500.0));
        assert!(state.clicked(None, &registry, 600.0).is_empty());
    }

    #[test]
    fn auto_select_picks_a_different_fragment() {
        let registry = registry(4);
        for seed in 0..20 {
            let mut state = InteractionState::with_seed(seed);
            state.clicked(Some(2), &registry, 0.0);
            state.clicked(None, &registry, 0.0);
            assert!(state.tick(9_999.0, &registry).is_empty());
            state.tick(10_000.0, &registry);
            let picked = state.selected().expect("auto-selected");
            assert_ne!(picked, 2, "seed {seed}");
            assert!(!state.user_has_interacted());
            assert_eq!(state.auto_select_deadline(), Some(20_000.0));
            state.tick(20_000.0, &registry);
            assert_ne!(state.selected(), Some(picked), "seed {seed}");
        }
    }

    #[test]
    fn interaction_disables_auto_select_for_good() {
        let registry = registry(3);
        let mut state = InteractionState::with_seed(3);
        state.arm_auto_select(0.0);
        state.clicked(Some(1), &registry, 100.0);
        assert_eq!(state.auto_select_deadline(), None);
        state.arm_auto_select(200.0);
        for t in [10_000.0, 50_000.0, 1_000_000.0] {
            assert!(state.tick(t, &registry).is_empty());
        }
        assert_eq!(state.selected(), Some(1));
    }

    #[test]
    fn confirm_locks_interaction() {
        let registry = registry(3);
        let mut state = InteractionState::with_seed(1);
        assert!(state.confirm().is_empty());
        state.clicked(Some(0), &registry, 0.0);
        assert_eq!(state.confirm(), vec![ShowContinue(false), BeginTransition(0)]);
        assert!(state.is_animating_transition());
        assert!(state.confirm().is_empty());
        assert!(state.pointer_moved(Some(1), &registry).is_empty());
        assert!(state.clicked(Some(1), &registry, 1.0).is_empty());
        assert_eq!(state.transitioning(), Some(0));
    }
}
