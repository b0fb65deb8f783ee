//! Page-level UI collaborator: text labels, the fade overlay and the
//! "continue" affordance. Styling is the host's business.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomNodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomNodeKind {
    /// Workshop name shown while a fragment is hovered or selected.
    Label,
    /// Title or subtitle attached to a gallery set.
    Caption,
    /// Full-viewport overlay used for fades.
    Overlay,
    /// Shown only while a fragment is selected.
    ContinueButton,
}

pub trait DomHost {
    fn create_node(&mut self, kind: DomNodeKind) -> DomNodeId;
    fn set_text(&mut self, node: DomNodeId, text: &str);
    fn set_opacity(&mut self, node: DomNodeId, opacity: f32);
    fn set_visible(&mut self, node: DomNodeId, visible: bool);
    fn set_color(&mut self, node: DomNodeId, rgb: [f32; 3]);
    fn remove_node(&mut self, node: DomNodeId);
}

const LABEL_FADE_MS: f32 = 300.0;

/// Eases a label's opacity toward its target at a fixed rate per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelFader {
    current: f32,
    target: f32,
}

impl Default for LabelFader {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelFader {
    pub fn new() -> Self {
        Self {
            current: 0.0,
            target: 0.0,
        }
    }

    pub fn show(&mut self) {
        self.target = 1.0;
    }

    pub fn hide(&mut self) {
        self.target = 0.0;
    }

    pub fn opacity(&self) -> f32 {
        self.current
    }

    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Advance by `dt_ms`; returns the new opacity.
    pub fn step(&mut self, dt_ms: f32) -> f32 {
        let delta = (dt_ms.max(0.0) / LABEL_FADE_MS).min(1.0);
        if self.current < self.target {
            self.current = (self.current + delta).min(self.target);
        } else if self.current > self.target {
            self.current = (self.current - delta).max(self.target);
        }
        self.current
    }
}
