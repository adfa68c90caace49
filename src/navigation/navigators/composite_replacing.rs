//! # Composite Replacing Navigator
//!
//! Holds exactly one child navigator. [`replace`](CompositeReplacingNavigator::replace)
//! swaps it for another; there is nothing to go back to, so a back press the
//! child does not consume finishes this navigator.
//!
//! Saved as `{"class": <child key>, "state": <child state>?}`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::child::Child;
use crate::core::logger::{self, Logger};
use crate::navigation::effect::{ChildEffect, EffectQueue, Transition};
use crate::navigation::event::{ListenerRegistry, NavigatorEvent, TransitionData};
use crate::navigation::schedule;
use crate::navigation::{
    BackPressHandler, Listener, ListenerHandle, Navigator, NavigatorError, NavigatorFactory,
    NavigatorKey, NavigatorRef, SaveableNavigator,
};
use crate::presentation::SceneRef;
use crate::state::{NavigatorState, StateValue};

const TAG: &str = "CompositeReplacingNavigator";

const CLASS: &str = "class";
const STATE: &str = "state";

#[derive(Clone)]
enum State {
    Inactive(Child),
    Active(Child),
    Destroyed,
}

type Step = Transition<State, ChildEffect>;

impl State {
    fn child(&self) -> Option<&Child> {
        match self {
            State::Inactive(child) | State::Active(child) => Some(child),
            State::Destroyed => None,
        }
    }

    fn start(&self) -> Step {
        match self {
            State::Inactive(child) => {
                Step::to(State::Active(child.clone()), vec![child.start(None)])
            }
            other => Step::stay(other.clone()),
        }
    }

    fn stop(&self) -> Step {
        match self {
            State::Active(child) => Step::to(State::Inactive(child.clone()), vec![child.stop()]),
            other => Step::stay(other.clone()),
        }
    }

    fn replace(&self, next: Child) -> Step {
        match self {
            State::Inactive(child) => Step::to(
                State::Inactive(next),
                vec![child.unsubscribe(), child.destroy()],
            ),
            State::Active(child) => Step::to(
                State::Active(next.clone()),
                vec![
                    child.unsubscribe(),
                    child.stop(),
                    child.destroy(),
                    next.start(Some(TransitionData::FORWARD)),
                ],
            ),
            State::Destroyed => Step::stay(State::Destroyed),
        }
    }

    fn destroy(&self, finished: bool) -> Step {
        let mut effects = Vec::new();
        let child = match self {
            State::Inactive(child) => child,
            State::Active(child) => {
                effects.push(child.stop());
                child
            }
            State::Destroyed => return Step::stay(State::Destroyed),
        };
        effects.push(child.unsubscribe());
        effects.push(child.destroy());
        if finished {
            effects.push(ChildEffect::Notify(NavigatorEvent::Finished));
        }
        effects.push(ChildEffect::ReleaseListeners);
        Step::to(State::Destroyed, effects)
    }

    fn child_finished(&self, id: u64) -> Step {
        match self.child() {
            Some(child) if child.id == id => Step::to(
                State::Destroyed,
                vec![
                    child.unsubscribe(),
                    child.destroy(),
                    ChildEffect::Notify(NavigatorEvent::Finished),
                    ChildEffect::ReleaseListeners,
                ],
            ),
            _ => Step::stay(self.clone()),
        }
    }
}

/// Shows one child navigator at a time.
pub struct CompositeReplacingNavigator {
    key: NavigatorKey,
    this: Weak<CompositeReplacingNavigator>,
    state: RefCell<State>,
    listeners: Rc<ListenerRegistry>,
    effects: EffectQueue<ChildEffect>,
    incoming: Cell<Option<TransitionData>>,
    current_scene: RefCell<Option<SceneRef>>,
    next_id: Cell<u64>,
    logger: Rc<dyn Logger>,
}

pub struct CompositeReplacingNavigatorBuilder<'a> {
    key: NavigatorKey,
    saved: Option<(&'a NavigatorState, &'a dyn NavigatorFactory)>,
    logger: Rc<dyn Logger>,
}

impl<'a> CompositeReplacingNavigatorBuilder<'a> {
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

    /// Builds the navigator. `initial_child` is only called when nothing was
    /// restored.
    pub fn build(
        self,
        initial_child: impl FnOnce() -> NavigatorRef,
    ) -> Result<Rc<CompositeReplacingNavigator>, NavigatorError> {
        let restored = match self.saved {
            Some((saved, factory)) => restore_child(&self.key, saved, factory, &*self.logger)?,
            None => None,
        };
        let navigator = restored.unwrap_or_else(initial_child);

        Ok(Rc::new_cyclic(|this| {
            let child = Child::subscribe(this, 1, navigator, CompositeReplacingNavigator::on_child_event);
            CompositeReplacingNavigator {
                key: self.key,
                this: this.clone(),
                state: RefCell::new(State::Inactive(child)),
                listeners: ListenerRegistry::new(),
                effects: EffectQueue::default(),
                incoming: Cell::new(None),
                current_scene: RefCell::new(None),
                next_id: Cell::new(1),
                logger: self.logger,
            }
        }))
    }
}

fn restore_child(
    key: &NavigatorKey,
    saved: &NavigatorState,
    factory: &dyn NavigatorFactory,
    logger: &dyn Logger,
) -> Result<Option<NavigatorRef>, NavigatorError> {
    let class: Option<String> = saved.get(CLASS);
    let state = match saved.get_value(STATE) {
        None => Some(None),
        Some(StateValue::State(state)) => Some(Some(state)),
        Some(_) => None,
    };
    let (Some(class), Some(state)) = (class, state) else {
        logger.warn(
            TAG,
            &format!("{key}: saved state is missing or corrupt, using initial child"),
        );
        return Ok(None);
    };
    let child = factory.instantiate_navigator(&NavigatorKey::new(class), state)?;
    Ok(Some(child))
}

impl CompositeReplacingNavigator {
    pub fn builder<'a>(key: NavigatorKey) -> CompositeReplacingNavigatorBuilder<'a> {
        CompositeReplacingNavigatorBuilder {
            key,
            saved: None,
            logger: logger::noop(),
        }
    }

    pub fn new(
        key: NavigatorKey,
        initial_child: NavigatorRef,
    ) -> Result<Rc<CompositeReplacingNavigator>, NavigatorError> {
        Self::builder(key).build(|| initial_child)
    }

    /// Destroys the current child and shows `navigator` instead.
    pub fn replace(&self, navigator: NavigatorRef) {
        self.request("replace", move |nav| {
            nav.trace(&format!("replace with {}", navigator.key()));
            let id = nav.next_id.get() + 1;
            nav.next_id.set(id);
            let child = Child::subscribe(&nav.this, id, navigator, Self::on_child_event);
            nav.transition(|state| state.replace(child));
        });
    }

    pub fn finish(&self) {
        self.request("finish", |nav| {
            nav.trace("finish");
            nav.transition(|state| state.destroy(true));
        });
    }

    pub fn child(&self) -> Option<NavigatorRef> {
        self.state
            .borrow()
            .child()
            .map(|child| child.navigator.clone())
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.state.borrow(), State::Active(_))
    }

    fn on_child_event(&self, id: u64, event: &NavigatorEvent) {
        match event {
            NavigatorEvent::SceneChanged { scene, transition } => {
                let from_active_child = matches!(
                    &*self.state.borrow(),
                    State::Active(child) if child.id == id
                );
                if !from_active_child {
                    return;
                }
                let transition = transition.or(self.incoming.take());
                self.current_scene.replace(Some(scene.clone()));
                self.listeners
                    .notify(&NavigatorEvent::scene_changed(scene.clone(), transition));
            }
            NavigatorEvent::Finished => {
                self.trace("child finished");
                schedule::request(&self.this, move |nav: &CompositeReplacingNavigator| {
                    nav.transition(|state| state.child_finished(id));
                });
            }
        }
    }

    fn request(
        &self,
        operation: &'static str,
        work: impl FnOnce(&CompositeReplacingNavigator) + 'static,
    ) {
        schedule::request(&self.this, move |nav: &CompositeReplacingNavigator| {
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

impl Navigator for CompositeReplacingNavigator {
    fn key(&self) -> &NavigatorKey {
        &self.key
    }

    fn add_listener(&self, listener: Listener) -> ListenerHandle {
        if self.ignored("add_listener") {
            return ListenerHandle::disposed();
        }
        let handle = self.listeners.add(listener);
        let replay = handle.clone();
        schedule::request(&self.this, move |nav: &CompositeReplacingNavigator| {
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

impl BackPressHandler for CompositeReplacingNavigator {
    fn on_back_pressed(&self) -> bool {
        let Some(child) = self.child() else {
            return false;
        };
        if let Some(handler) = child.back_press_handler() {
            if handler.on_back_pressed() {
                return true;
            }
        }
        if !self.is_destroyed() {
            self.finish();
        }
        true
    }
}

impl SaveableNavigator for CompositeReplacingNavigator {
    fn save_instance_state(&self) -> NavigatorState {
        let mut saved = NavigatorState::new();
        if let Some(child) = self.child() {
            saved.set(CLASS, child.key().to_string());
            saved.set_optional(
                STATE,
                child
                    .saveable()
                    .map(|saveable| saveable.save_instance_state()),
            );
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::StackNavigator;
    use crate::test_support::{
        CallLog, PassiveNavigator, RecordingLogger, TestScene, call_log, entries, record_events,
        scene_name, test_scene_factory,
    };

    const PAGES: NavigatorKey = NavigatorKey::from_static("pages");

    fn pages(names: &[&str], log: &CallLog) -> NavigatorRef {
        let scenes = names.iter().map(|n| TestScene::create(n, log)).collect();
        StackNavigator::new(PAGES, scenes).unwrap()
    }

    fn replacing(child: NavigatorRef) -> Rc<CompositeReplacingNavigator> {
        CompositeReplacingNavigator::new(NavigatorKey::from_static("flow"), child).unwrap()
    }

    #[test]
    fn test_replace_while_active_swaps_children_forward() {
        let log = call_log();
        let nav = replacing(pages(&["login"], &log));
        nav.on_start();
        let (events, _) = record_events(&*nav);

        nav.replace(pages(&["home"], &log));

        assert_eq!(
            entries(&log),
            vec!["login.start", "login.stop", "login.destroy", "home.start"]
        );
        assert_eq!(
            entries(&events),
            vec!["scene(login, none)", "scene(home, forward)"]
        );
    }

    #[test]
    fn test_replace_while_inactive_only_destroys_old_child() {
        let log = call_log();
        let nav = replacing(pages(&["login"], &log));
        let (events, _) = record_events(&*nav);

        nav.replace(pages(&["home"], &log));

        assert_eq!(entries(&log), vec!["login.destroy"]);
        assert!(entries(&events).is_empty());
    }

    #[test]
    fn test_back_press_goes_to_child_first() {
        let log = call_log();
        let nav = replacing(pages(&["a", "b"], &log));
        nav.on_start();
        let (events, _) = record_events(&*nav);

        assert!(nav.on_back_pressed());
        assert!(!nav.is_destroyed());
        assert!(nav.on_back_pressed());
        assert!(nav.is_destroyed());
        assert!(!nav.on_back_pressed());

        assert_eq!(
            entries(&events),
            vec!["scene(b, none)", "scene(a, backward)", "finished"]
        );
    }

    #[test]
    fn test_back_press_not_consumed_by_child_finishes() {
        let log = call_log();
        let nav = replacing(PassiveNavigator::create(TestScene::create("p", &log)));
        nav.on_start();
        let (events, _) = record_events(&*nav);

        assert!(nav.on_back_pressed());

        assert_eq!(entries(&log), vec!["p.start", "p.stop", "p.destroy"]);
        assert_eq!(entries(&events), vec!["scene(p, none)", "finished"]);
    }

    #[test]
    fn test_replaced_child_events_are_ignored() {
        let log = call_log();
        let old = StackNavigator::new(PAGES, vec![TestScene::create("old", &log)]).unwrap();
        let nav = replacing(old.clone());
        nav.on_start();
        nav.replace(pages(&["new"], &log));
        let (events, _) = record_events(&*nav);

        old.push(TestScene::create("ghost", &log));

        assert_eq!(entries(&events), vec!["scene(new, none)"]);
    }

    #[test]
    fn test_finish_from_listener_waits_for_the_child_operation() {
        let log = call_log();
        let inner = StackNavigator::new(PAGES, vec![TestScene::create("a", &log)]).unwrap();
        let nav = replacing(inner.clone());
        nav.on_start();
        let weak = Rc::downgrade(&nav);
        let _handle = nav.add_listener(Rc::new(move |event: &NavigatorEvent| {
            let on_b = event.scene().is_some_and(|scene| scene_name(scene) == "b");
            if let (true, Some(nav)) = (on_b, weak.upgrade()) {
                nav.finish();
            }
        }));

        inner.push(TestScene::create("b", &log));

        assert_eq!(
            entries(&log),
            vec!["a.start", "a.stop", "b.start", "b.stop", "b.destroy", "a.destroy"]
        );
        assert!(nav.is_destroyed());
    }

    #[test]
    fn test_operations_after_destroy_are_ignored_with_warning() {
        let log = call_log();
        let logger = Rc::new(RecordingLogger::default());
        let nav = CompositeReplacingNavigator::builder(NavigatorKey::from_static("flow"))
            .logger(logger.clone())
            .build(|| pages(&["a"], &log))
            .unwrap();
        nav.on_destroy();

        nav.replace(pages(&["b"], &log));
        nav.finish();
        nav.on_start();

        assert_eq!(entries(&log), vec!["a.destroy"]);
        assert!(nav.child().is_none());
        assert_eq!(logger.count(log::Level::Warn), 3);
    }

    #[test]
    fn test_save_and_restore_child() {
        let log = call_log();
        let nav = replacing(
            StackNavigator::new(PAGES, vec![TestScene::with_foo("a", 3, &log)]).unwrap(),
        );
        let saved = nav.save_instance_state();
        assert_eq!(saved.get::<String>("class").as_deref(), Some("pages"));

        let scenes = test_scene_factory(&log);
        let factory = |key: &NavigatorKey,
                       state: Option<&NavigatorState>|
         -> Result<NavigatorRef, NavigatorError> {
            assert_eq!(*key, PAGES);
            let navigator: NavigatorRef = StackNavigator::builder(PAGES)
                .restore(state, &scenes)
                .build(Vec::new)?;
            Ok(navigator)
        };
        let restored = CompositeReplacingNavigator::builder(NavigatorKey::from_static("flow"))
            .restore(Some(&saved), &factory)
            .build(|| pages(&["fallback"], &log))
            .unwrap();

        let child = restored.child().unwrap();
        let child = child.downcast_ref::<StackNavigator>().unwrap();
        assert_eq!(scene_name(&child.scenes()[0]), "a");
    }

    #[test]
    fn test_missing_class_falls_back_to_initial_child() {
        let log = call_log();
        let factory = |key: &NavigatorKey,
                       _: Option<&NavigatorState>|
         -> Result<NavigatorRef, NavigatorError> {
            Err(NavigatorError::UnknownNavigator(key.clone()))
        };
        let saved = NavigatorState::new();

        let nav = CompositeReplacingNavigator::builder(NavigatorKey::from_static("flow"))
            .restore(Some(&saved), &factory)
            .build(|| pages(&["fallback"], &log))
            .unwrap();

        assert_eq!(nav.child().unwrap().key(), &PAGES);
    }
}
