//! # Wizard Navigator
//!
//! A linear sequence of scenes, materialized lazily through [`WizardSteps`].
//! Each index is created at most once; going back reuses the scenes already
//! created. The wizard finishes once the steps produce no scene for the next
//! index.
//!
//! ```text
//!   index:      0 ──next──► 1 ──next──► 2 ──next──► (no scene) ──► finished
//!                 ◄─previous─  ◄─previous─
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
use crate::presentation::{SceneKey, SceneRef};
use crate::state::NavigatorState;

const TAG: &str = "WizardNavigator";

/// Creates the scene for a wizard index, starting at 0. `None` marks the end
/// of the wizard.
pub trait WizardSteps {
    fn create_scene(&self, index: usize) -> Option<SceneRef>;
}

impl<F> WizardSteps for F
where
    F: Fn(usize) -> Option<SceneRef>,
{
    fn create_scene(&self, index: usize) -> Option<SceneRef> {
        self(index)
    }
}

#[derive(Clone)]
struct Position {
    scenes: NonEmpty<SceneRef>,
    index: usize,
}

impl Position {
    fn current(&self) -> &SceneRef {
        // index < scenes.len() holds for every constructed position
        &self.scenes.as_slice()[self.index]
    }
}

#[derive(Clone)]
enum State {
    Inactive(Position),
    Active(Position),
    Destroyed,
}

type Step = Transition<State, SceneEffect>;

impl State {
    fn position(&self) -> Option<&Position> {
        match self {
            State::Inactive(position) | State::Active(position) => Some(position),
            State::Destroyed => None,
        }
    }

    fn start(&self) -> Step {
        match self {
            State::Inactive(position) => {
                let current = position.current().clone();
                Step::to(
                    State::Active(position.clone()),
                    vec![
                        SceneEffect::Start(current.clone()),
                        SceneEffect::Notify(NavigatorEvent::scene_changed(current, None)),
                    ],
                )
            }
            other => Step::stay(other.clone()),
        }
    }

    fn stop(&self) -> Step {
        match self {
            State::Active(position) => Step::to(
                State::Inactive(position.clone()),
                vec![SceneEffect::Stop(position.current().clone())],
            ),
            other => Step::stay(other.clone()),
        }
    }

    /// Stops the current scene ahead of `next`. The navigator stays active.
    fn leave_current(&self) -> Step {
        match self {
            State::Active(position) => Step::to(
                State::Active(position.clone()),
                vec![SceneEffect::Stop(position.current().clone())],
            ),
            other => Step::stay(other.clone()),
        }
    }

    /// Moves to the next index once the current scene has been left.
    /// `extended` holds the scenes materialized up to at least that index, or
    /// `None` when the wizard has no further scene.
    fn next(&self, extended: Option<NonEmpty<SceneRef>>) -> Step {
        let (position, active) = match self {
            State::Inactive(position) => (position, false),
            State::Active(position) => (position, true),
            State::Destroyed => return Step::stay(State::Destroyed),
        };
        let index = position.index + 1;
        let Some(scenes) = extended.filter(|scenes| scenes.len() > index) else {
            let mut effects: Vec<SceneEffect> =
                SceneEffect::destroy_all(position.scenes.as_slice()).collect();
            effects.push(SceneEffect::Notify(NavigatorEvent::Finished));
            effects.push(SceneEffect::ReleaseListeners);
            return Step::to(State::Destroyed, effects);
        };

        let next = Position { scenes, index };
        if !active {
            return Step::stay(State::Inactive(next));
        }
        let scene = next.current().clone();
        Step::to(
            State::Active(next),
            vec![
                SceneEffect::Start(scene.clone()),
                SceneEffect::Notify(NavigatorEvent::scene_changed(
                    scene,
                    Some(TransitionData::FORWARD),
                )),
            ],
        )
    }

    fn previous(&self) -> Step {
        match self {
            State::Inactive(position) if position.index > 0 => Step::stay(State::Inactive(Position {
                scenes: position.scenes.clone(),
                index: position.index - 1,
            })),
            State::Active(position) if position.index > 0 => {
                let previous = Position {
                    scenes: position.scenes.clone(),
                    index: position.index - 1,
                };
                let scene = previous.current().clone();
                Step::to(
                    State::Active(previous),
                    vec![
                        SceneEffect::Stop(position.current().clone()),
                        SceneEffect::Start(scene.clone()),
                        SceneEffect::Notify(NavigatorEvent::scene_changed(
                            scene,
                            Some(TransitionData::BACKWARD),
                        )),
                    ],
                )
            }
            other => Step::stay(other.clone()),
        }
    }

    /// Listeners hear `finished` before the scenes are torn down.
    fn finish(&self) -> Step {
        let mut effects = vec![SceneEffect::Notify(NavigatorEvent::Finished)];
        let Transition {
            next,
            effects: teardown,
        } = self.destroy();
        effects.extend(teardown);
        Step::to(next, effects)
    }

    fn destroy(&self) -> Step {
        let mut effects = Vec::new();
        let position = match self {
            State::Inactive(position) => position,
            State::Active(position) => {
                effects.push(SceneEffect::Stop(position.current().clone()));
                position
            }
            State::Destroyed => return Step::stay(State::Destroyed),
        };
        effects.extend(SceneEffect::destroy_all(position.scenes.as_slice()));
        effects.push(SceneEffect::ReleaseListeners);
        Step::to(State::Destroyed, effects)
    }
}

/// Navigates forward and backward through a lazily created sequence of
/// scenes.
pub struct WizardNavigator {
    this: Weak<WizardNavigator>,
    key: NavigatorKey,
    steps: Box<dyn WizardSteps>,
    state: RefCell<State>,
    listeners: Rc<ListenerRegistry>,
    effects: EffectQueue<SceneEffect>,
    logger: Rc<dyn Logger>,
}

pub struct WizardNavigatorBuilder<'a> {
    key: NavigatorKey,
    steps: Box<dyn WizardSteps>,
    saved: Option<(&'a NavigatorState, &'a dyn SceneFactory)>,
    logger: Rc<dyn Logger>,
}

impl<'a> WizardNavigatorBuilder<'a> {
    /// Rebuilds the materialized scenes and the current index from `saved`
    /// when possible.
    pub fn restore(mut self, saved: Option<&'a NavigatorState>, factory: &'a dyn SceneFactory) -> Self {
        self.saved = saved.map(|saved| (saved, factory));
        self
    }

    pub fn logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Result<Rc<WizardNavigator>, NavigatorError> {
        let restored = match self.saved {
            Some((saved, factory)) => restore_position(&self.key, saved, factory, &*self.logger)?,
            None => None,
        };
        let position = match restored {
            Some(position) => position,
            None => {
                let first = self
                    .steps
                    .create_scene(0)
                    .ok_or_else(|| NavigatorError::EmptyWizard {
                        navigator: self.key.clone(),
                    })?;
                Position {
                    scenes: NonEmpty::single(first),
                    index: 0,
                }
            }
        };

        Ok(Rc::new_cyclic(|this| WizardNavigator {
            this: this.clone(),
            key: self.key,
            steps: self.steps,
            state: RefCell::new(State::Inactive(position)),
            listeners: ListenerRegistry::new(),
            effects: EffectQueue::default(),
            logger: self.logger,
        }))
    }
}

fn restore_position(
    key: &NavigatorKey,
    saved: &NavigatorState,
    factory: &dyn SceneFactory,
    logger: &dyn Logger,
) -> Result<Option<Position>, NavigatorError> {
    let Some(list) = saved::read(saved) else {
        logger.warn(
            TAG,
            &format!("{key}: saved state is missing or corrupt, starting from the first step"),
        );
        return Ok(None);
    };
    let scenes = list
        .entries
        .iter()
        .map(|entry| factory.instantiate_scene(&SceneKey::new(entry.class.clone()), entry.state))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(NonEmpty::new(scenes).map(|scenes| Position {
        scenes,
        index: list.active_index,
    }))
}

impl WizardNavigator {
    pub fn builder<'a>(key: NavigatorKey, steps: impl WizardSteps + 'static) -> WizardNavigatorBuilder<'a> {
        WizardNavigatorBuilder {
            key,
            steps: Box::new(steps),
            saved: None,
            logger: logger::noop(),
        }
    }

    pub fn new(
        key: NavigatorKey,
        steps: impl WizardSteps + 'static,
    ) -> Result<Rc<WizardNavigator>, NavigatorError> {
        Self::builder(key, steps).build()
    }

    /// Moves to the next scene, creating it if needed. Finishes when there is
    /// none, even while inactive. The current scene is stopped before the
    /// next one is created.
    pub fn next(&self) {
        self.request("next", |nav| {
            nav.transition(State::leave_current);
            let Some(position) = nav.state.borrow().position().cloned() else {
                return;
            };
            let extended = nav.filled_up_to(position.scenes, position.index + 1);
            nav.transition(|state| state.next(extended));
        });
    }

    /// Moves back one scene. Does nothing on the first scene.
    pub fn previous(&self) {
        self.request("previous", |nav| nav.transition(State::previous));
    }

    /// Notifies listeners that the wizard is done, then destroys every scene.
    pub fn finish(&self) {
        self.request("finish", |nav| nav.transition(State::finish));
    }

    /// Index of the current scene, `None` once destroyed.
    pub fn active_index(&self) -> Option<usize> {
        self.state.borrow().position().map(|position| position.index)
    }

    /// Every scene created so far, including those after the current one.
    pub fn scenes(&self) -> Vec<SceneRef> {
        self.state
            .borrow()
            .position()
            .map(|position| position.scenes.as_slice().to_vec())
            .unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.state.borrow(), State::Active(_))
    }

    /// Runs with no borrow of the state held; the steps may be user code.
    fn filled_up_to(&self, mut scenes: NonEmpty<SceneRef>, index: usize) -> Option<NonEmpty<SceneRef>> {
        while scenes.len() <= index {
            let scene = self.steps.create_scene(scenes.len())?;
            scenes = scenes.pushed(scene);
        }
        Some(scenes)
    }

    /// Runs `operation` once nothing else is running. A destroyed navigator
    /// ignores it with a warning.
    fn request(
        &self,
        operation: &'static str,
        work: impl FnOnce(&WizardNavigator) + 'static,
    ) {
        schedule::request(&self.this, move |nav: &WizardNavigator| {
            if nav.ignored(operation) {
                return;
            }
            nav.trace(operation);
            work(nav);
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
            State::Active(position) => Some(position.current().clone()),
            State::Inactive(_) | State::Destroyed => None,
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

impl Navigator for WizardNavigator {
    fn key(&self) -> &NavigatorKey {
        &self.key
    }

    fn add_listener(&self, listener: Listener) -> ListenerHandle {
        if self.ignored("add_listener") {
            return ListenerHandle::disposed();
        }
        let handle = self.listeners.add(listener);
        let replay = handle.clone();
        schedule::request(&self.this, move |nav: &WizardNavigator| {
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
            self.transition(State::destroy);
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

impl BackPressHandler for WizardNavigator {
    fn on_back_pressed(&self) -> bool {
        let Some(index) = self.active_index() else {
            return false;
        };
        self.trace("back pressed");
        if index == 0 {
            self.finish();
        } else {
            self.previous();
        }
        true
    }
}

impl SaveableNavigator for WizardNavigator {
    fn save_instance_state(&self) -> NavigatorState {
        let scenes = self.scenes();
        saved::write(
            scenes.iter().map(|scene| {
                let scene = scene.borrow();
                (
                    scene.key().to_string(),
                    scene.saveable().map(|s| s.save_instance_state()),
                )
            }),
            self.active_index().unwrap_or_default(),
        )
    }
}
