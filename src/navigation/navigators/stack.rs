//! # Stack Navigator
//!
//! An ordered, non-empty stack of scenes. The top scene is the active one.
//!
//! ```text
//!               push / pop / replace
//!   Inactive ◄──────────────────────► Inactive     (stack changes silently)
//!      │ ▲
//!  start│ │stop
//!      ▼ │
//!    Active  ──── push / replace ────► Active      (FORWARD)
//!      │     ──── pop (size > 1) ────► Active      (BACKWARD)
//!      │
//!      └── pop last / finish / destroy ──► Destroyed (terminal)
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::core::logger::{self, Logger};
use crate::navigation::effect::{EffectQueue, SceneEffect, Transition};
use crate::navigation::event::{ListenerRegistry, NavigatorEvent, TransitionData};
use crate::navigation::non_empty::NonEmpty;
use crate::navigation::{saved, schedule};
use crate::navigation::{
    BackPressHandler, Listener, ListenerHandle, Navigator, NavigatorError, NavigatorKey,
    SaveableNavigator, SceneFactory,
};
use crate::presentation::scene::describe;
use crate::presentation::{SceneKey, SceneRef};
use crate::state::NavigatorState;

const TAG: &str = "StackNavigator";

#[derive(Clone)]
enum State {
    Inactive(NonEmpty<SceneRef>),
    Active(NonEmpty<SceneRef>),
    Destroyed,
}

type Step = Transition<State, SceneEffect>;

fn changed(scene: &SceneRef, transition: TransitionData) -> SceneEffect {
    SceneEffect::Notify(NavigatorEvent::scene_changed(
        scene.clone(),
        Some(transition),
    ))
}

impl State {
    fn start(&self) -> Step {
        match self {
            State::Inactive(scenes) => {
                let top = scenes.top().clone();
                Step::to(
                    State::Active(scenes.clone()),
                    vec![
                        SceneEffect::Start(top.clone()),
                        SceneEffect::Notify(NavigatorEvent::scene_changed(top, None)),
                    ],
                )
            }
            other => Step::stay(other.clone()),
        }
    }

    fn stop(&self) -> Step {
        match self {
            State::Active(scenes) => Step::to(
                State::Inactive(scenes.clone()),
                vec![SceneEffect::Stop(scenes.top().clone())],
            ),
            other => Step::stay(other.clone()),
        }
    }

    fn push(&self, scene: SceneRef) -> Step {
        match self {
            State::Inactive(scenes) => Step::stay(State::Inactive(scenes.pushed(scene))),
            State::Active(scenes) => Step::to(
                State::Active(scenes.pushed(scene.clone())),
                vec![
                    SceneEffect::Stop(scenes.top().clone()),
                    SceneEffect::Start(scene.clone()),
                    changed(&scene, TransitionData::FORWARD),
                ],
            ),
            State::Destroyed => Step::stay(State::Destroyed),
        }
    }

    fn pop(&self) -> Step {
        match self {
            State::Inactive(scenes) => {
                let top = scenes.top().clone();
                match scenes.popped() {
                    Some(rest) => Step::to(State::Inactive(rest), vec![SceneEffect::Destroy(top)]),
                    None => Step::to(
                        State::Destroyed,
                        vec![
                            SceneEffect::Destroy(top),
                            SceneEffect::Notify(NavigatorEvent::Finished),
                            SceneEffect::ReleaseListeners,
                        ],
                    ),
                }
            }
            State::Active(scenes) => {
                let top = scenes.top().clone();
                match scenes.popped() {
                    Some(rest) => {
                        let next = rest.top().clone();
                        Step::to(
                            State::Active(rest),
                            vec![
                                SceneEffect::Stop(top.clone()),
                                SceneEffect::Destroy(top),
                                SceneEffect::Start(next.clone()),
                                changed(&next, TransitionData::BACKWARD),
                            ],
                        )
                    }
                    None => Step::to(
                        State::Destroyed,
                        vec![
                            SceneEffect::Stop(top.clone()),
                            SceneEffect::Destroy(top),
                            SceneEffect::Notify(NavigatorEvent::Finished),
                            SceneEffect::ReleaseListeners,
                        ],
                    ),
                }
            }
            State::Destroyed => Step::stay(State::Destroyed),
        }
    }

    fn replace(&self, scene: SceneRef) -> Step {
        match self {
            State::Inactive(scenes) => Step::to(
                State::Inactive(scenes.with_top_replaced(scene)),
                vec![SceneEffect::Destroy(scenes.top().clone())],
            ),
            State::Active(scenes) => {
                let top = scenes.top().clone();
                Step::to(
                    State::Active(scenes.with_top_replaced(scene.clone())),
                    vec![
                        SceneEffect::Stop(top.clone()),
                        SceneEffect::Destroy(top),
                        SceneEffect::Start(scene.clone()),
                        changed(&scene, TransitionData::FORWARD),
                    ],
                )
            }
            State::Destroyed => Step::stay(State::Destroyed),
        }
    }

    /// Tears everything down. `finished` adds the finished notification.
    fn destroy(&self, finished: bool) -> Step {
        let mut effects = Vec::new();
        let scenes = match self {
            State::Inactive(scenes) => scenes,
            State::Active(scenes) => {
                effects.push(SceneEffect::Stop(scenes.top().clone()));
                scenes
            }
            State::Destroyed => return Step::stay(State::Destroyed),
        };
        effects.extend(SceneEffect::destroy_all(scenes.as_slice()));
        if finished {
            effects.push(SceneEffect::Notify(NavigatorEvent::Finished));
        }
        effects.push(SceneEffect::ReleaseListeners);
        Step::to(State::Destroyed, effects)
    }
}

/// Navigates through an ordered stack of scenes.
pub struct StackNavigator {
    this: Weak<StackNavigator>,
    key: NavigatorKey,
    state: RefCell<State>,
    listeners: Rc<ListenerRegistry>,
    effects: EffectQueue<SceneEffect>,
    logger: Rc<dyn Logger>,
}

/// Configures a [`StackNavigator`] before its initial stack is known.
pub struct StackNavigatorBuilder<'a> {
    key: NavigatorKey,
    saved: Option<(&'a NavigatorState, &'a dyn SceneFactory)>,
    logger: Rc<dyn Logger>,
}

impl<'a> StackNavigatorBuilder<'a> {
    /// Rebuilds the stack from `saved` through `factory` when possible.
    pub fn restore(mut self, saved: Option<&'a NavigatorState>, factory: &'a dyn SceneFactory) -> Self {
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
        initial_stack: impl FnOnce() -> Vec<SceneRef>,
    ) -> Result<Rc<StackNavigator>, NavigatorError> {
        let restored = match self.saved {
            Some((saved, factory)) => restore_scenes(&self.key, saved, factory, &*self.logger)?,
            None => None,
        };
        let scenes = match restored {
            Some(scenes) => scenes,
            None => NonEmpty::new(initial_stack()).ok_or_else(|| NavigatorError::EmptyStack {
                navigator: self.key.clone(),
            })?,
        };

        Ok(Rc::new_cyclic(|this| StackNavigator {
            this: this.clone(),
            key: self.key,
            state: RefCell::new(State::Inactive(scenes)),
            listeners: ListenerRegistry::new(),
            effects: EffectQueue::default(),
            logger: self.logger,
        }))
    }
}

/// Rebuilds scenes from the saved list. `Ok(None)` means the saved state was
/// unusable and the caller should fall back to its initial content.
pub(super) fn restore_scenes(
    key: &NavigatorKey,
    saved: &NavigatorState,
    factory: &dyn SceneFactory,
    logger: &dyn Logger,
) -> Result<Option<NonEmpty<SceneRef>>, NavigatorError> {
    let Some(list) = saved::read(saved) else {
        logger.warn(
            TAG,
            &format!("{key}: saved state is missing or corrupt, using initial stack"),
        );
        return Ok(None);
    };
    let scenes = list
        .entries
        .iter()
        .map(|entry| factory.instantiate_scene(&SceneKey::new(entry.class.clone()), entry.state))
        .collect::<Result<Vec<_>, _>>()?;
    logger.debug(TAG, &format!("{key}: restored {} scenes", scenes.len()));
    Ok(NonEmpty::new(scenes))
}

impl StackNavigator {
    pub fn builder<'a>(key: NavigatorKey) -> StackNavigatorBuilder<'a> {
        StackNavigatorBuilder {
            key,
            saved: None,
            logger: logger::noop(),
        }
    }

    /// A fresh navigator over `initial_stack`, bottom first.
    pub fn new(
        key: NavigatorKey,
        initial_stack: Vec<SceneRef>,
    ) -> Result<Rc<StackNavigator>, NavigatorError> {
        Self::builder(key).build(|| initial_stack)
    }

    /// Pushes `scene` on top of the stack.
    pub fn push(&self, scene: SceneRef) {
        self.request("push", move |state| state.push(scene));
    }

    /// Removes the top scene. Popping the last scene finishes the navigator.
    pub fn pop(&self) {
        self.request("pop", State::pop);
    }

    /// Swaps the top scene for `scene`.
    pub fn replace(&self, scene: SceneRef) {
        self.request("replace", move |state| state.replace(scene));
    }

    /// Destroys every scene and notifies listeners that this navigator is done.
    pub fn finish(&self) {
        self.request("finish", |state| state.destroy(true));
    }

    /// The current stack, bottom first. Empty once destroyed.
    pub fn scenes(&self) -> Vec<SceneRef> {
        match &*self.state.borrow() {
            State::Inactive(scenes) | State::Active(scenes) => scenes.as_slice().to_vec(),
            State::Destroyed => Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.state.borrow(), State::Active(_))
    }

    /// Runs `operation` once nothing else is running. A destroyed navigator
    /// ignores it with a warning.
    fn request(&self, operation: &'static str, step: impl FnOnce(&State) -> Step + 'static) {
        schedule::request(&self.this, move |nav: &StackNavigator| {
            if nav.ignored(operation) {
                return;
            }
            nav.trace(&format!("{operation} on {}", nav.describe_top()));
            nav.transition(step);
        });
    }

    fn transition(&self, step: impl FnOnce(&State) -> Step) {
        let Transition { next, effects } = step(&self.state.borrow());
        self.state.replace(next);
        self.effects
            .run(effects, |effect| effect.apply(&self.listeners));
    }

    fn active_scene(&self) -> Option<SceneRef> {
        match &*self.state.borrow() {
            State::Active(scenes) => Some(scenes.top().clone()),
            State::Inactive(_) | State::Destroyed => None,
        }
    }

    fn describe_top(&self) -> String {
        match &*self.state.borrow() {
            State::Inactive(scenes) | State::Active(scenes) => describe(scenes.top()),
            State::Destroyed => "nothing".to_string(),
        }
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

impl Navigator for StackNavigator {
    fn key(&self) -> &NavigatorKey {
        &self.key
    }

    fn add_listener(&self, listener: Listener) -> ListenerHandle {
        if self.ignored("add_listener") {
            return ListenerHandle::disposed();
        }
        let handle = self.listeners.add(listener);
        let replay = handle.clone();
        schedule::request(&self.this, move |nav: &StackNavigator| {
            nav.listeners.replay(&replay, nav.active_scene());
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

impl BackPressHandler for StackNavigator {
    fn on_back_pressed(&self) -> bool {
        let size = match &*self.state.borrow() {
            State::Inactive(scenes) | State::Active(scenes) => scenes.len(),
            State::Destroyed => return false,
        };
        self.trace("back pressed");
        if size > 1 {
            self.pop();
        } else {
            self.finish();
        }
        true
    }
}

impl SaveableNavigator for StackNavigator {
    fn save_instance_state(&self) -> NavigatorState {
        let scenes = self.scenes();
        let active_index = scenes.len().saturating_sub(1);
        saved::write(
            scenes.iter().map(|scene| {
                let scene = scene.borrow();
                (
                    scene.key().to_string(),
                    scene.saveable().map(|s| s.save_instance_state()),
                )
            }),
            active_index,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        RecordingLogger, TestScene, call_log, entries, record_events, recording_listener,
        scene_name, test_scene_factory,
    };

    fn stack_of(names: &[&str], log: &crate::test_support::CallLog) -> Rc<StackNavigator> {
        let scenes = names.iter().map(|n| TestScene::create(n, log)).collect();
        StackNavigator::new(NavigatorKey::from_static("stack"), scenes).unwrap()
    }

    #[test]
    fn test_empty_initial_stack_is_rejected() {
        let result = StackNavigator::new(NavigatorKey::from_static("stack"), Vec::new());
        assert!(matches!(result, Err(NavigatorError::EmptyStack { .. })));
    }

    #[test]
    fn test_start_starts_only_the_top_scene() {
        let log = call_log();
        let nav = stack_of(&["a", "b"], &log);
        let (events, _) = record_events(&*nav);

        nav.on_start();

        assert_eq!(entries(&log), vec!["b.start"]);
        assert_eq!(entries(&events), vec!["scene(b, none)"]);
    }

    #[test]
    fn test_push_while_active_stops_old_and_starts_new() {
        let log = call_log();
        let nav = stack_of(&["a"], &log);
        nav.on_start();
        let (events, _) = record_events(&*nav);

        nav.push(TestScene::create("b", &log));

        assert_eq!(entries(&log), vec!["a.start", "a.stop", "b.start"]);
        assert_eq!(entries(&events), vec!["scene(a, none)", "scene(b, forward)"]);
    }

    #[test]
    fn test_push_while_inactive_is_silent() {
        let log = call_log();
        let nav = stack_of(&["a"], &log);
        let (events, _) = record_events(&*nav);

        nav.push(TestScene::create("b", &log));

        assert!(entries(&log).is_empty());
        assert!(entries(&events).is_empty());

        nav.on_start();
        assert_eq!(entries(&log), vec!["b.start"]);
    }

    #[test]
    fn test_pop_while_active_notifies_backward() {
        let log = call_log();
        let nav = stack_of(&["a", "b"], &log);
        nav.on_start();
        let (events, _) = record_events(&*nav);

        nav.pop();

        assert_eq!(
            entries(&log),
            vec!["b.start", "b.stop", "b.destroy", "a.start"]
        );
        assert_eq!(entries(&events), vec!["scene(b, none)", "scene(a, backward)"]);
    }

    #[test]
    fn test_pop_last_scene_finishes_once() {
        let log = call_log();
        let nav = stack_of(&["a"], &log);
        let (events, _) = record_events(&*nav);

        nav.pop();

        assert_eq!(entries(&log), vec!["a.destroy"]);
        assert_eq!(entries(&events), vec!["finished"]);
        assert!(nav.is_destroyed());
    }

    #[test]
    fn test_pop_last_active_scene_stops_before_destroy() {
        let log = call_log();
        let nav = stack_of(&["a"], &log);
        nav.on_start();

        nav.pop();

        assert_eq!(entries(&log), vec!["a.start", "a.stop", "a.destroy"]);
    }

    #[test]
    fn test_replace_while_active_sends_single_forward_event() {
        let log = call_log();
        let nav = stack_of(&["a"], &log);
        nav.on_start();
        let (events, _) = record_events(&*nav);

        nav.replace(TestScene::create("b", &log));

        assert_eq!(
            entries(&log),
            vec!["a.start", "a.stop", "a.destroy", "b.start"]
        );
        assert_eq!(entries(&events), vec!["scene(a, none)", "scene(b, forward)"]);
        assert_eq!(nav.scenes().len(), 1);
    }

    #[test]
    fn test_replace_while_inactive_destroys_old_top() {
        let log = call_log();
        let nav = stack_of(&["a"], &log);

        nav.replace(TestScene::create("b", &log));

        assert_eq!(entries(&log), vec!["a.destroy"]);
        assert_eq!(scene_name(&nav.scenes()[0]), "b");
    }

    #[test]
    fn test_back_press_pops_then_finishes() {
        let log = call_log();
        let nav = stack_of(&["a", "b"], &log);
        nav.on_start();
        let (events, _) = record_events(&*nav);

        assert!(nav.on_back_pressed());
        assert!(nav.on_back_pressed());
        assert!(!nav.on_back_pressed());

        assert_eq!(
            entries(&events),
            vec!["scene(b, none)", "scene(a, backward)", "finished"]
        );
    }

    #[test]
    fn test_destroy_stops_top_and_destroys_in_reverse() {
        let log = call_log();
        let nav = stack_of(&["a", "b", "c"], &log);
        nav.on_start();
        let (events, _) = record_events(&*nav);

        nav.on_destroy();
        nav.on_destroy();

        assert_eq!(
            entries(&log),
            vec!["c.start", "c.stop", "c.destroy", "b.destroy", "a.destroy"]
        );
        assert_eq!(entries(&events), vec!["scene(c, none)"]);
    }

    #[test]
    fn test_operations_after_destroy_are_ignored_with_warning() {
        let log = call_log();
        let logger = Rc::new(RecordingLogger::default());
        let nav = StackNavigator::builder(NavigatorKey::from_static("stack"))
            .logger(logger.clone())
            .build(|| vec![TestScene::create("a", &log)])
            .unwrap();
        nav.on_destroy();

        nav.push(TestScene::create("b", &log));
        nav.pop();
        nav.on_start();

        assert_eq!(entries(&log), vec!["a.destroy"]);
        assert_eq!(logger.count(log::Level::Warn), 3);
    }

    #[test]
    fn test_listener_added_while_inactive_gets_no_replay() {
        let log = call_log();
        let nav = stack_of(&["a"], &log);
        let (events, _) = record_events(&*nav);
        assert!(entries(&events).is_empty());
    }

    #[test]
    fn test_listener_added_after_destroy_is_disposed() {
        let log = call_log();
        let nav = stack_of(&["a"], &log);
        nav.finish();

        let (events, handle) = record_events(&*nav);

        assert!(handle.is_disposed());
        assert!(entries(&events).is_empty());
    }

    #[test]
    fn test_listener_can_pop_during_notification() {
        let log = call_log();
        let nav = stack_of(&["a", "b", "c"], &log);
        nav.on_start();
        let weak = Rc::downgrade(&nav);
        let popped = Rc::new(std::cell::Cell::new(false));
        let flag = popped.clone();
        nav.add_listener(Rc::new(move |event: &NavigatorEvent| {
            if event.transition().is_some_and(|t| t.is_backward()) && !flag.replace(true) {
                if let Some(nav) = weak.upgrade() {
                    nav.pop();
                }
            }
        }));

        nav.pop();

        assert_eq!(
            entries(&log),
            vec![
                "c.start", "c.stop", "c.destroy", "b.start", "b.stop", "b.destroy", "a.start"
            ]
        );
        assert_eq!(nav.scenes().len(), 1);
    }

    #[test]
    fn test_listener_added_while_top_stops_hears_new_scene_once() {
        let log = call_log();
        let slot: Rc<RefCell<Option<Weak<StackNavigator>>>> = Rc::default();
        let hook_slot = slot.clone();
        let hook_log = log.clone();
        let a = TestScene::with_hook("a", &log, move |call| {
            let nav = hook_slot.borrow().as_ref().and_then(Weak::upgrade);
            if let (Some(nav), "stop") = (nav, call) {
                let _handle = nav.add_listener(recording_listener(&hook_log));
            }
        });
        let nav = StackNavigator::new(NavigatorKey::from_static("stack"), vec![a]).unwrap();
        *slot.borrow_mut() = Some(Rc::downgrade(&nav));
        nav.on_start();

        nav.push(TestScene::create("b", &log));

        assert_eq!(
            entries(&log),
            vec!["a.start", "a.stop", "b.start", "scene(b, forward)"]
        );
    }

    #[test]
    fn test_save_and_restore_round_trip() {
        let log = call_log();
        let nav = StackNavigator::new(
            NavigatorKey::from_static("stack"),
            vec![
                TestScene::create("a", &log),
                TestScene::with_foo("b", 3, &log),
            ],
        )
        .unwrap();
        let saved = nav.save_instance_state();

        let factory = test_scene_factory(&log);
        let restored = StackNavigator::builder(NavigatorKey::from_static("stack"))
            .restore(Some(&saved), &factory)
            .build(Vec::new)
            .unwrap();

        let scenes = restored.scenes();
        assert_eq!(scenes.len(), 2);
        assert!(!crate::presentation::same_scene(&scenes[1], &nav.scenes()[1]));
        let top = scenes[1].borrow();
        let top = top.downcast_ref::<TestScene>().unwrap();
        assert_eq!((top.name.as_str(), top.foo), ("b", 3));
    }

    #[test]
    fn test_corrupt_saved_state_falls_back_to_initial_stack() {
        let log = call_log();
        let logger = Rc::new(RecordingLogger::default());
        let mut saved = NavigatorState::new();
        saved.set("size", "two");
        let factory = test_scene_factory(&log);

        let nav = StackNavigator::builder(NavigatorKey::from_static("stack"))
            .restore(Some(&saved), &factory)
            .logger(logger.clone())
            .build(|| vec![TestScene::create("initial", &log)])
            .unwrap();

        assert_eq!(scene_name(&nav.scenes()[0]), "initial");
        assert_eq!(logger.count(log::Level::Warn), 1);
    }

    #[test]
    fn test_unknown_scene_key_fails_restore() {
        let log = call_log();
        let saved = saved::write(vec![("mystery".to_string(), None)], 0);
        let factory = test_scene_factory(&log);

        let result = StackNavigator::builder(NavigatorKey::from_static("stack"))
            .restore(Some(&saved), &factory)
            .build(Vec::new);

        assert!(matches!(result, Err(NavigatorError::UnknownScene(_))));
    }
}
