//! A navigator that shows one scene for its whole life.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::core::logger::{self, Logger};
use crate::navigation::effect::{EffectQueue, SceneEffect, Transition};
use crate::navigation::event::{ListenerRegistry, NavigatorEvent};
use crate::navigation::schedule;
use crate::navigation::{
    BackPressHandler, Listener, ListenerHandle, Navigator, NavigatorKey, SaveableNavigator,
};
use crate::presentation::SceneRef;
use crate::state::{NavigatorState, SceneState};

const TAG: &str = "SingleSceneNavigator";

const SCENE: &str = "scene";

#[derive(Clone)]
enum State {
    Inactive(SceneRef),
    Active(SceneRef),
    Destroyed,
}

type Step = Transition<State, SceneEffect>;

impl State {
    fn start(&self) -> Step {
        match self {
            State::Inactive(scene) => Step::to(
                State::Active(scene.clone()),
                vec![
                    SceneEffect::Start(scene.clone()),
                    SceneEffect::Notify(NavigatorEvent::scene_changed(scene.clone(), None)),
                ],
            ),
            other => Step::stay(other.clone()),
        }
    }

    fn stop(&self) -> Step {
        match self {
            State::Active(scene) => Step::to(
                State::Inactive(scene.clone()),
                vec![SceneEffect::Stop(scene.clone())],
            ),
            other => Step::stay(other.clone()),
        }
    }

    fn destroy(&self, finished: bool) -> Step {
        let mut effects = Vec::new();
        match self {
            State::Inactive(scene) => effects.push(SceneEffect::Destroy(scene.clone())),
            State::Active(scene) => {
                effects.push(SceneEffect::Stop(scene.clone()));
                effects.push(SceneEffect::Destroy(scene.clone()));
            }
            State::Destroyed => return Step::stay(State::Destroyed),
        }
        if finished {
            effects.push(SceneEffect::Notify(NavigatorEvent::Finished));
        }
        effects.push(SceneEffect::ReleaseListeners);
        Step::to(State::Destroyed, effects)
    }
}

pub struct SingleSceneNavigator {
    this: Weak<SingleSceneNavigator>,
    key: NavigatorKey,
    state: RefCell<State>,
    listeners: Rc<ListenerRegistry>,
    effects: EffectQueue<SceneEffect>,
    logger: Rc<dyn Logger>,
}

pub struct SingleSceneNavigatorBuilder<'a> {
    key: NavigatorKey,
    saved: Option<&'a NavigatorState>,
    logger: Rc<dyn Logger>,
}

impl<'a> SingleSceneNavigatorBuilder<'a> {
    pub fn restore(mut self, saved: Option<&'a NavigatorState>) -> Self {
        self.saved = saved;
        self
    }

    pub fn logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// `create_scene` receives the scene's saved state when there is one.
    pub fn build(
        self,
        create_scene: impl FnOnce(Option<&SceneState>) -> SceneRef,
    ) -> Rc<SingleSceneNavigator> {
        let scene_state = self.saved.and_then(|saved| saved.get_state(SCENE));
        let scene = create_scene(scene_state);
        Rc::new_cyclic(|this| SingleSceneNavigator {
            this: this.clone(),
            key: self.key,
            state: RefCell::new(State::Inactive(scene)),
            listeners: ListenerRegistry::new(),
            effects: EffectQueue::default(),
            logger: self.logger,
        })
    }
}

impl SingleSceneNavigator {
    pub fn builder<'a>(key: NavigatorKey) -> SingleSceneNavigatorBuilder<'a> {
        SingleSceneNavigatorBuilder {
            key,
            saved: None,
            logger: logger::noop(),
        }
    }

    pub fn new(key: NavigatorKey, scene: SceneRef) -> Rc<SingleSceneNavigator> {
        Self::builder(key).build(|_| scene)
    }

    pub fn finish(&self) {
        schedule::request(&self.this, |nav: &SingleSceneNavigator| {
            if nav.ignored("finish") {
                return;
            }
            nav.trace("finish");
            nav.transition(|state| state.destroy(true));
        });
    }

    pub fn scene(&self) -> Option<SceneRef> {
        match &*self.state.borrow() {
            State::Inactive(scene) | State::Active(scene) => Some(scene.clone()),
            State::Destroyed => None,
        }
    }

    fn transition(&self, step: impl FnOnce(&State) -> Step) {
        let Transition { next, effects } = step(&self.state.borrow());
        self.state.replace(next);
        self.effects
            .run(effects, |effect| effect.apply(&self.listeners));
    }

    fn active_scene(&self) -> Option<SceneRef> {
        match &*self.state.borrow() {
            State::Active(scene) => Some(scene.clone()),
            State::Inactive(_) | State::Destroyed => None,
        }
    }

    fn ignored(&self, operation: &str) -> bool {
        let destroyed = self.is_destroyed();
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

impl Navigator for SingleSceneNavigator {
    fn key(&self) -> &NavigatorKey {
        &self.key
    }

    fn add_listener(&self, listener: Listener) -> ListenerHandle {
        if self.ignored("add_listener") {
            return ListenerHandle::disposed();
        }
        let handle = self.listeners.add(listener);
        let replay = handle.clone();
        schedule::request(&self.this, move |nav: &SingleSceneNavigator| {
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

impl BackPressHandler for SingleSceneNavigator {
    fn on_back_pressed(&self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        self.finish();
        true
    }
}

impl SaveableNavigator for SingleSceneNavigator {
    fn save_instance_state(&self) -> NavigatorState {
        let mut saved = NavigatorState::new();
        if let Some(scene) = self.scene() {
            saved.set_optional(
                SCENE,
                scene.borrow().saveable().map(|s| s.save_instance_state()),
            );
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingLogger, TestScene, call_log, entries, record_events};

    const SINGLE: NavigatorKey = NavigatorKey::from_static("single");

    #[test]
    fn test_lifecycle_is_forwarded_to_the_scene() {
        let log = call_log();
        let nav = SingleSceneNavigator::new(SINGLE, TestScene::create("a", &log));
        let (events, _) = record_events(&*nav);

        nav.on_start();
        nav.on_stop();
        nav.on_destroy();

        assert_eq!(entries(&log), vec!["a.start", "a.stop", "a.destroy"]);
        assert_eq!(entries(&events), vec!["scene(a, none)"]);
    }

    #[test]
    fn test_back_press_finishes() {
        let log = call_log();
        let nav = SingleSceneNavigator::new(SINGLE, TestScene::create("a", &log));
        nav.on_start();
        let (events, _) = record_events(&*nav);

        assert!(nav.on_back_pressed());
        assert!(!nav.on_back_pressed());

        assert_eq!(entries(&events), vec!["scene(a, none)", "finished"]);
    }

    #[test]
    fn test_operations_after_destroy_are_ignored_with_warning() {
        let log = call_log();
        let logger = Rc::new(RecordingLogger::default());
        let nav = SingleSceneNavigator::builder(SINGLE)
            .logger(logger.clone())
            .build(|_| TestScene::create("a", &log));
        nav.on_destroy();

        nav.finish();
        nav.on_start();
        let (events, handle) = record_events(&*nav);
        nav.on_stop();

        assert_eq!(entries(&log), vec!["a.destroy"]);
        assert!(entries(&events).is_empty());
        assert!(handle.is_disposed());
        assert_eq!(logger.count(log::Level::Warn), 3);
    }

    #[test]
    fn test_scene_state_is_handed_back_on_restore() {
        let log = call_log();
        let nav = SingleSceneNavigator::new(SINGLE, TestScene::with_foo("a", 3, &log));
        let saved = nav.save_instance_state();

        let restored = SingleSceneNavigator::builder(SINGLE)
            .restore(Some(&saved))
            .build(|state| {
                let foo = state.and_then(|s| s.get::<i64>("foo")).unwrap_or_default();
                TestScene::with_foo("restored", foo, &log)
            });

        let scene = restored.scene().unwrap();
        let scene = scene.borrow();
        assert_eq!(scene.downcast_ref::<TestScene>().unwrap().foo, 3);
    }
}
