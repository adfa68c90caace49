//! # Effects
//!
//! Navigator transitions are pure: given the current state variant and an
//! operation, they return the next variant plus the side effects to run.
//!
//! ```text
//! State + Operation  →  transition()  →  (New State, Vec<Effect>)
//!                                              │
//!                                   commit ◄───┘ then drain effects in order
//! ```
//!
//! The new state is committed before any effect runs, and no borrow of
//! navigator state is held while user code runs. Effects are drained through
//! a FIFO queue. Operations requested by a scene or listener while effects
//! drain wait in the `schedule` module until the current operation is done,
//! so a navigator higher up never starts a scene before the lower levels
//! have stopped theirs.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::event::{ListenerHandle, ListenerRegistry, NavigatorEvent, TransitionData};
use super::navigator::NavigatorRef;
use crate::presentation::SceneRef;

/// Result of a pure transition.
pub(crate) struct Transition<S, E> {
    pub(crate) next: S,
    pub(crate) effects: Vec<E>,
}

impl<S, E> Transition<S, E> {
    pub(crate) fn to(next: S, effects: Vec<E>) -> Self {
        Self { next, effects }
    }

    pub(crate) fn stay(state: S) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }
}

/// FIFO of pending effects with a re-entrancy guard.
pub(crate) struct EffectQueue<E> {
    pending: RefCell<VecDeque<E>>,
    draining: Cell<bool>,
}

impl<E> Default for EffectQueue<E> {
    fn default() -> Self {
        Self {
            pending: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
        }
    }
}

impl<E> EffectQueue<E> {
    /// Queues `effects` and, unless an outer call is already draining, runs
    /// them (and anything queued meanwhile) through `run`.
    pub(crate) fn run(&self, effects: Vec<E>, mut run: impl FnMut(E)) {
        self.pending.borrow_mut().extend(effects);
        if self.draining.replace(true) {
            return;
        }
        loop {
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some(effect) => run(effect),
                None => break,
            }
        }
        self.draining.set(false);
    }
}

/// Side effects of scene-owning navigators.
pub(crate) enum SceneEffect {
    Start(SceneRef),
    Stop(SceneRef),
    Destroy(SceneRef),
    Notify(NavigatorEvent),
    /// Drops every listener; queued last when a navigator is destroyed.
    ReleaseListeners,
}

impl SceneEffect {
    /// `Destroy` for every scene, top of the stack first.
    pub(crate) fn destroy_all(scenes: &[SceneRef]) -> impl Iterator<Item = SceneEffect> + '_ {
        scenes.iter().rev().cloned().map(SceneEffect::Destroy)
    }

    pub(crate) fn apply(self, listeners: &ListenerRegistry) {
        match self {
            SceneEffect::Start(scene) => scene.borrow_mut().on_start(),
            SceneEffect::Stop(scene) => scene.borrow_mut().on_stop(),
            SceneEffect::Destroy(scene) => scene.borrow_mut().on_destroy(),
            SceneEffect::Notify(event) => listeners.notify(&event),
            SceneEffect::ReleaseListeners => listeners.clear(),
        }
    }
}

/// Side effects of navigators that own child navigators.
pub(crate) enum ChildEffect {
    /// Starts the child. Scene changes it reports while starting are tagged
    /// with the transition unless they carry their own.
    Start(NavigatorRef, Option<TransitionData>),
    Stop(NavigatorRef),
    Destroy(NavigatorRef),
    Unsubscribe(ListenerHandle),
    Notify(NavigatorEvent),
    ReleaseListeners,
}

impl ChildEffect {
    pub(crate) fn apply(
        self,
        listeners: &ListenerRegistry,
        incoming: &Cell<Option<TransitionData>>,
    ) {
        match self {
            ChildEffect::Start(child, transition) => {
                incoming.set(transition);
                child.on_start();
                incoming.set(None);
            }
            ChildEffect::Stop(child) => child.on_stop(),
            ChildEffect::Destroy(child) => child.on_destroy(),
            ChildEffect::Unsubscribe(handle) => handle.dispose(),
            ChildEffect::Notify(event) => listeners.notify(&event),
            ChildEffect::ReleaseListeners => listeners.clear(),
        }
    }
}
