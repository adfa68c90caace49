//! # Composite Stack Navigator
//!
//! A stack of child navigators. Only the top child is ever started; the
//! children below it stay paused until they become the top again.
//!
//! ```text
//!   listeners ◄── forward (tag direction) ◄── top child ◄── its own children
//!                                              │
//!        push / replace ──► Start(new, FORWARD)│
//!        pop / child done ──► Start(next, BACKWARD)
//! ```
//!
//! Scene changes coming from a child carry the child's own transition data
//! when it has any. A child that reports its scene without transition data
//! while this navigator is starting it after a push or pop gets the direction
//! of that push or pop.
//!
//! A child that finishes is taken off once the operation that finished it is
//! over. By then its scenes are stopped and destroyed, so the child below
//! starts last.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::child::{self, Child};
use crate::core::logger::{self, Logger};
use crate::navigation::effect::{ChildEffect, EffectQueue, Transition};
use crate::navigation::event::{ListenerRegistry, NavigatorEvent, TransitionData};
use crate::navigation::non_empty::NonEmpty;
use crate::navigation::{saved, schedule};
use crate::navigation::{
    BackPressHandler, Listener, ListenerHandle, Navigator, NavigatorError, NavigatorFactory,
    NavigatorKey, NavigatorRef, SaveableNavigator,
};
use crate::presentation::SceneRef;
use crate::state::NavigatorState;

const TAG: &str = "CompositeStackNavigator";

#[derive(Clone)]
enum State {
    Inactive(NonEmpty<Child>),
    Active(NonEmpty<Child>),
    Destroyed,
}

type Step = Transition<State, ChildEffect>;

impl State {
    fn children(&self) -> Option<&NonEmpty<Child>> {
        match self {
            State::Inactive(children) | State::Active(children) => Some(children),
            State::Destroyed => None,
        }
    }

    fn start(&self) -> Step {
        match self {
            State::Inactive(children) => Step::to(
                State::Active(children.clone()),
                vec![children.top().start(None)],
            ),
            other => Step::stay(other.clone()),
        }
    }

    fn stop(&self) -> Step {
        match self {
            State::Active(children) => Step::to(
                State::Inactive(children.clone()),
                vec![children.top().stop()],
            ),
            other => Step::stay(other.clone()),
        }
    }

    fn push(&self, child: Child) -> Step {
        match self {
            State::Inactive(children) => Step::stay(State::Inactive(children.pushed(child))),
            State::Active(children) => Step::to(
                State::Active(children.pushed(child.clone())),
                vec![
                    children.top().stop(),
                    child.start(Some(TransitionData::FORWARD)),
                ],
            ),
            State::Destroyed => Step::stay(State::Destroyed),
        }
    }

    fn pop(&self) -> Step {
        let (children, active) = match self {
            State::Inactive(children) => (children, false),
            State::Active(children) => (children, true),
            State::Destroyed => return Step::stay(State::Destroyed),
        };
        let top = children.top();
        let mut effects = vec![top.unsubscribe()];
        if active {
            effects.push(top.stop());
        }
        effects.push(top.destroy());
        Self::after_removal(children.popped(), active, effects)
    }

    fn replace(&self, child: Child) -> Step {
        match self {
            State::Inactive(children) => {
                let top = children.top();
                Step::to(
                    State::Inactive(children.with_top_replaced(child)),
                    vec![top.unsubscribe(), top.destroy()],
                )
            }
            State::Active(children) => {
                let top = children.top();
                Step::to(
                    State::Active(children.with_top_replaced(child.clone())),
                    vec![
                        top.unsubscribe(),
                        top.stop(),
                        top.destroy(),
                        child.start(Some(TransitionData::FORWARD)),
                    ],
                )
            }
            State::Destroyed => Step::stay(State::Destroyed),
        }
    }

    /// The child `id` finished on its own.
    fn child_finished(&self, id: u64) -> Step {
        let (children, active) = match self {
            State::Inactive(children) => (children, false),
            State::Active(children) => (children, true),
            State::Destroyed => return Step::stay(State::Destroyed),
        };
        let Some(index) = children.position(|child| child.id == id) else {
            return Step::stay(self.clone());
        };
        let finished = &children.as_slice()[index];
        let effects = vec![finished.unsubscribe(), finished.destroy()];

        if index + 1 < children.len() {
            // A paused child below the top finished; nothing visible changes.
            let rest = children.without(index);
            return match rest {
                Some(rest) if active => Step::to(State::Active(rest), effects),
                Some(rest) => Step::to(State::Inactive(rest), effects),
                None => Step::stay(self.clone()),
            };
        }
        Self::after_removal(children.without(index), active, effects)
    }

    /// Continues once the top child has been taken off: either the next child
    /// becomes the top or this navigator finishes.
    fn after_removal(rest: Option<NonEmpty<Child>>, active: bool, mut effects: Vec<ChildEffect>) -> Step {
        match rest {
            Some(rest) if active => {
                effects.push(rest.top().start(Some(TransitionData::BACKWARD)));
                Step::to(State::Active(rest), effects)
            }
            Some(rest) => Step::to(State::Inactive(rest), effects),
            None => {
                effects.push(ChildEffect::Notify(NavigatorEvent::Finished));
                effects.push(ChildEffect::ReleaseListeners);
                Step::to(State::Destroyed, effects)
            }
        }
    }

    fn destroy(&self, finished: bool) -> Step {
        let mut effects = Vec::new();
        let children = match self {
            State::Inactive(children) => children,
            State::Active(children) => {
                effects.push(children.top().stop());
                children
            }
            State::Destroyed => return Step::stay(State::Destroyed),
        };
        for child in children.as_slice().iter().rev() {
            effects.push(child.unsubscribe());
            effects.push(child.destroy());
        }
        if finished {
            effects.push(ChildEffect::Notify(NavigatorEvent::Finished));
        }
        effects.push(ChildEffect::ReleaseListeners);
        Step::to(State::Destroyed, effects)
    }
}

/// Navigates through a stack of child navigators.
pub struct CompositeStackNavigator {
    key: NavigatorKey,
    this: Weak<CompositeStackNavigator>,
    state: RefCell<State>,
    listeners: Rc<ListenerRegistry>,
    effects: EffectQueue<ChildEffect>,
    incoming: Cell<Option<TransitionData>>,
    current_scene: RefCell<Option<SceneRef>>,
    next_id: Cell<u64>,
    logger: Rc<dyn Logger>,
}

pub struct CompositeStackNavigatorBuilder<'a> {
    key: NavigatorKey,
    saved: Option<(&'a NavigatorState, &'a dyn NavigatorFactory)>,
    logger: Rc<dyn Logger>,
}

impl<'a> CompositeStackNavigatorBuilder<'a> {
    /// Rebuilds the children from `saved` through `factory` when possible.
    pub fn restore(
        mut self,
        saved: Option<&'a NavigatorState>,
        factory: &'a dyn NavigatorFactory,
    ) -> Self {
        self.saved = saved.map(|saved| (saved, factory));
        self
    }

    pub fn logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Builds the navigator. `initial_stack` is only called when nothing was
    /// restored.
    pub fn build(
        self,
        initial_stack: impl FnOnce() -> Vec<NavigatorRef>,
    ) -> Result<Rc<CompositeStackNavigator>, NavigatorError> {
        let restored = match self.saved {
            Some((saved, factory)) => {
                child::restore_children(TAG, &self.key, saved, factory, &*self.logger)?
            }
            None => None,
        };
        let navigators = restored
            .map(|(children, _)| children)
            .unwrap_or_else(initial_stack);
        let navigators = NonEmpty::new(navigators).ok_or_else(|| NavigatorError::EmptyStack {
            navigator: self.key.clone(),
        })?;

        Ok(Rc::new_cyclic(|this| {
            let mut next_id = 0;
            let children = navigators.map(|navigator| {
                next_id += 1;
                Child::subscribe(this, next_id, navigator, CompositeStackNavigator::on_child_event)
            });
            CompositeStackNavigator {
                key: self.key,
                this: this.clone(),
                state: RefCell::new(State::Inactive(children)),
                listeners: ListenerRegistry::new(),
                effects: EffectQueue::default(),
                incoming: Cell::new(None),
                current_scene: RefCell::new(None),
                next_id: Cell::new(next_id),
                logger: self.logger,
            }
        }))
    }
}

impl CompositeStackNavigator {
    pub fn builder<'a>(key: NavigatorKey) -> CompositeStackNavigatorBuilder<'a> {
        CompositeStackNavigatorBuilder {
            key,
            saved: None,
            logger: logger::noop(),
        }
    }

    /// A fresh navigator over `initial_stack`, bottom first.
    pub fn new(
        key: NavigatorKey,
        initial_stack: Vec<NavigatorRef>,
    ) -> Result<Rc<CompositeStackNavigator>, NavigatorError> {
        Self::builder(key).build(|| initial_stack)
    }

    /// Pushes `navigator` on top; it becomes the active child.
    pub fn push(&self, navigator: NavigatorRef) {
        self.request("push", move |nav| {
            nav.trace(&format!("push {}", navigator.key()));
            let child = nav.adopt(navigator);
            nav.transition(|state| state.push(child));
        });
    }

    /// Destroys the top child. Popping the last child finishes this navigator.
    pub fn pop(&self) {
        self.request("pop", |nav| {
            nav.trace("pop");
            nav.transition(State::pop);
        });
    }

    /// Destroys the top child and puts `navigator` in its place.
    pub fn replace(&self, navigator: NavigatorRef) {
        self.request("replace", move |nav| {
            nav.trace(&format!("replace with {}", navigator.key()));
            let child = nav.adopt(navigator);
            nav.transition(|state| state.replace(child));
        });
    }

    /// Destroys every child and notifies listeners that this navigator is done.
    pub fn finish(&self) {
        self.request("finish", |nav| {
            nav.trace("finish");
            nav.transition(|state| state.destroy(true));
        });
    }

    /// The children, bottom first. Empty once destroyed.
    pub fn children(&self) -> Vec<NavigatorRef> {
        self.state
            .borrow()
            .children()
            .map(|children| {
                children
                    .as_slice()
                    .iter()
                    .map(|child| child.navigator.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The top child, whether or not this navigator is started.
    pub fn active_child(&self) -> Option<NavigatorRef> {
        self.state
            .borrow()
            .children()
            .map(|children| children.top().navigator.clone())
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.state.borrow(), State::Active(_))
    }

    fn adopt(&self, navigator: NavigatorRef) -> Child {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        Child::subscribe(&self.this, id, navigator, Self::on_child_event)
    }

    fn on_child_event(&self, id: u64, event: &NavigatorEvent) {
        match event {
            NavigatorEvent::SceneChanged { scene, transition } => {
                let from_active_top = matches!(
                    &*self.state.borrow(),
                    State::Active(children) if children.top().id == id
                );
                if !from_active_top {
                    return;
                }
                let transition = transition.or(self.incoming.take());
                self.current_scene.replace(Some(scene.clone()));
                self.listeners
                    .notify(&NavigatorEvent::scene_changed(scene.clone(), transition));
            }
            NavigatorEvent::Finished => {
                self.trace(&format!("child {id} finished"));
                schedule::request(&self.this, move |nav: &CompositeStackNavigator| {
                    nav.transition(|state| state.child_finished(id));
                });
            }
        }
    }

    /// Runs `operation` once nothing else is running. A destroyed navigator
    /// ignores it with a warning.
    fn request(
        &self,
        operation: &'static str,
        work: impl FnOnce(&CompositeStackNavigator) + 'static,
    ) {
        schedule::request(&self.this, move |nav: &CompositeStackNavigator| {
            if !nav.ignored(operation) {
                work(nav);
            }
        });
    }

    fn transition(&self, step: impl FnOnce(&State) -> Step) {
        let Transition { next, effects } = step(&self.state.borrow());
        if matches!(next, State::Destroyed) {
            self.current_scene.replace(None);
        }
        self.state.replace(next);
        self.effects.run(effects, |effect| self.apply(effect));
    }

    fn apply(&self, effect: ChildEffect) {
        effect.apply(&self.listeners, &self.incoming);
    }

    fn ignored(&self, operation: &str) -> bool {
        let destroyed = matches!(*self.state.borrow(), State::Destroyed);
        if destroyed {
            self.logger.warn(
                TAG,
                &format!("{}: {operation} ignored, navigator is destroyed", self.key),
            );
        }
        destroyed
    }

    fn trace(&self, message: &str) {
        self.logger.trace(TAG, &format!("{}: {message}", self.key));
    }
}

impl Navigator for CompositeStackNavigator {
    fn key(&self) -> &NavigatorKey {
        &self.key
    }

    fn add_listener(&self, listener: Listener) -> ListenerHandle {
        if self.ignored("add_listener") {
            return ListenerHandle::disposed();
        }
        let handle = self.listeners.add(listener);
        let replay = handle.clone();
        schedule::request(&self.this, move |nav: &CompositeStackNavigator| {
            let active = match &*nav.state.borrow() {
                State::Active(_) => nav.current_scene.borrow().clone(),
                State::Inactive(_) | State::Destroyed => None,
            };
            nav.listeners.replay(&replay, active);
        });
        handle
    }

    fn on_start(&self) {
        schedule::run(|| {
            if self.ignored("start") {
                return;
            }
            self.trace("start");
            self.transition(State::start);
        });
    }

    fn on_stop(&self) {
        schedule::run(|| {
            self.trace("stop");
            self.transition(State::stop);
        });
    }

    fn on_destroy(&self) {
        schedule::run(|| {
            self.trace("destroy");
            self.transition(|state| state.destroy(false));
        });
    }

    fn is_destroyed(&self) -> bool {
        matches!(*self.state.borrow(), State::Destroyed)
    }

    fn back_press_handler(&self) -> Option<&dyn BackPressHandler> {
        Some(self)
    }

    fn saveable(&self) -> Option<&dyn SaveableNavigator> {
        Some(self)
    }
}

impl BackPressHandler for CompositeStackNavigator {
    /// Offers the back press to the top child first. Only when the child does
    /// not consume it does this navigator pop (or finish on its last child).
    fn on_back_pressed(&self) -> bool {
        let Some(top) = self.active_child() else {
            return false;
        };
        if let Some(handler) = top.back_press_handler() {
            if handler.on_back_pressed() {
                self.trace(&format!("back press consumed by {}", top.key()));
                return true;
            }
        }

        let size = match self.state.borrow().children() {
            Some(children) => children.len(),
            None => return true,
        };
        if size > 1 {
            self.pop();
        } else {
            self.finish();
        }
        true
    }
}

impl SaveableNavigator for CompositeStackNavigator {
    fn save_instance_state(&self) -> NavigatorState {
        let state = self.state.borrow();
        let children = state
            .children()
            .map(|children| children.as_slice().to_vec())
            .unwrap_or_default();
        drop(state);
        let active_index = children.len().saturating_sub(1);
        saved::write(children.iter().map(Child::saved_entry), active_index)
    }
}
