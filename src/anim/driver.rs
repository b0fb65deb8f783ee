//! Per-frame animation scheduler.
//!
//! Every timed effect in a scene is a step closure registered here. Steps run
//! once per `tick` (one display refresh) in registration order until they
//! return `false` or are cancelled. Elapsed time passed to a step is measured
//! from the moment it was registered and never runs backwards.

use std::collections::HashMap;

/// Step callback: receives elapsed milliseconds since registration and the
/// mutable scene state it animates. Returning `false` ends the animation.
pub type StepFn<C> = Box<dyn FnMut(f64, &mut C) -> bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationToken(u64);

/// Exclusive writer slot. Starting an owned animation cancels whatever
/// animation previously held the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationOwner {
    Entity(usize),
    Camera,
    Overlay,
}

struct Entry<C> {
    token: AnimationToken,
    owner: Option<AnimationOwner>,
    started_ms: f64,
    step: StepFn<C>,
}

pub struct AnimationDriver<C> {
    next_token: u64,
    entries: Vec<Entry<C>>,
    owners: HashMap<AnimationOwner, AnimationToken>,
    last_tick_ms: f64,
}

impl<C> Default for AnimationDriver<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> AnimationDriver<C> {
    pub fn new() -> Self {
        Self {
            next_token: 1,
            entries: Vec::new(),
            owners: HashMap::new(),
            last_tick_ms: f64::NEG_INFINITY,
        }
    }

    /// Register an unowned animation starting at `now_ms`.
    pub fn run(&mut self, now_ms: f64, step: StepFn<C>) -> AnimationToken {
        self.insert(None, now_ms, step)
    }

    /// Register an animation that exclusively drives `owner`, cancelling the
    /// previous animation for that owner first.
    pub fn run_owned(
        &mut self,
        owner: AnimationOwner,
        now_ms: f64,
        step: StepFn<C>,
    ) -> AnimationToken {
        self.cancel_owner(owner);
        let token = self.insert(Some(owner), now_ms, step);
        self.owners.insert(owner, token);
        token
    }

    fn insert(
        &mut self,
        owner: Option<AnimationOwner>,
        now_ms: f64,
        step: StepFn<C>,
    ) -> AnimationToken {
        let token = AnimationToken(self.next_token);
        self.next_token += 1;
        self.entries.push(Entry {
            token,
            owner,
            started_ms: now_ms,
            step,
        });
        token
    }

    pub fn cancel(&mut self, token: AnimationToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.token != token);
        self.owners.retain(|_, owned| *owned != token);
        self.entries.len() != before
    }

    pub fn cancel_owner(&mut self, owner: AnimationOwner) -> bool {
        match self.owners.remove(&owner) {
            Some(token) => self.cancel(token),
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("Cancelling {} running animation(s)", self.entries.len());
        }
        self.entries.clear();
        self.owners.clear();
    }

    pub fn is_running(&self, token: AnimationToken) -> bool {
        self.entries.iter().any(|entry| entry.token == token)
    }

    pub fn owner_token(&self, owner: AnimationOwner) -> Option<AnimationToken> {
        self.owners.get(&owner).copied()
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    /// Advance every live animation by one frame.
    pub fn tick(&mut self, now_ms: f64, ctx: &mut C) {
        let now_ms = now_ms.max(self.last_tick_ms);
        self.last_tick_ms = now_ms;

        let running = std::mem::take(&mut self.entries);
        let mut kept = Vec::with_capacity(running.len());
        for mut entry in running {
            let elapsed = (now_ms - entry.started_ms).max(0.0);
            if (entry.step)(elapsed, ctx) {
                kept.push(entry);
            } else if let Some(owner) = entry.owner {
                if self.owners.get(&owner) == Some(&entry.token) {
                    self.owners.remove(&owner);
                }
            }
        }
        self.entries = kept;
    }
}
