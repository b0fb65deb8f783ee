//! The collaborators a scene talks to, bundled so they can be passed
//! explicitly to every scene operation.

pub mod headless;

use crate::assets::{AssetLoader, ContentLibrary};
use crate::config::ExperienceConfig;
use crate::render::{RenderBackend, Viewport};
use crate::ui::DomHost;
use std::collections::BTreeMap;

/// Input delivered by the host, in viewport pixels where positional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f32, y: f32 },
    Click { x: f32, y: f32 },
    Wheel { delta_y: f32 },
    Resize(Viewport),
    /// The "continue" affordance was activated.
    Confirm,
    /// Browser-style back navigation.
    Back,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::Click { .. } => EventKind::Click,
            Self::Wheel { .. } => EventKind::Wheel,
            Self::Resize(_) => EventKind::Resize,
            Self::Confirm => EventKind::Confirm,
            Self::Back => EventKind::Back,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    PointerMove,
    Click,
    Wheel,
    Resize,
    Confirm,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerOwner {
    Scene(SceneId),
    /// Installed by the embedding host, never touched by scene teardown.
    Host,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Registry of installed input listeners.
#[derive(Debug, Default)]
pub struct EventHub {
    next_id: u64,
    listeners: BTreeMap<ListenerId, (EventKind, ListenerOwner)>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, kind: EventKind, owner: ListenerOwner) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.insert(id, (kind, owner));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if !removed {
            log::warn!("Listener {:?} was already removed", id);
        }
        removed
    }

    pub fn is_listening(&self, kind: EventKind, owner: ListenerOwner) -> bool {
        self.listeners
            .values()
            .any(|(listener_kind, listener_owner)| *listener_kind == kind && *listener_owner == owner)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn count_for_owner(&self, owner: ListenerOwner) -> usize {
        self.listeners
            .values()
            .filter(|(_, listener_owner)| *listener_owner == owner)
            .count()
    }
}

pub struct Platform {
    pub renderer: Box<dyn RenderBackend>,
    pub dom: Box<dyn DomHost>,
    pub loader: Box<dyn AssetLoader>,
    pub events: EventHub,
    pub content: ContentLibrary,
    pub config: ExperienceConfig,
    pub viewport: Viewport,
}

impl Platform {
    pub fn new(
        renderer: Box<dyn RenderBackend>,
        dom: Box<dyn DomHost>,
        loader: Box<dyn AssetLoader>,
        config: ExperienceConfig,
        content: ContentLibrary,
        viewport: Viewport,
    ) -> Self {
        Self {
            renderer,
            dom,
            loader,
            events: EventHub::new(),
            content,
            config,
            viewport,
        }
    }
}
