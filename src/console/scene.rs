//! Scenes and the view the console host moves between them.

use std::rc::Rc;

use crate::core::logger::Logger;
use crate::navigation::{
    NavigatorError, NavigatorFactory, NavigatorKey, NavigatorRef, SceneFactory, StackNavigator,
    WizardNavigator,
};
use crate::presentation::{
    BasicScene, Container, Lifecycle, SaveableScene, Scene, SceneKey, SceneRef, scene_ref,
};
use crate::state::{ContainerState, NavigatorState, SceneState};

pub const PAGE: SceneKey = SceneKey::from_static("page");
pub const ONBOARDING_STEP: SceneKey = SceneKey::from_static("onboarding_step");

pub const PAGES: NavigatorKey = NavigatorKey::from_static("pages");
pub const ONBOARDING: NavigatorKey = NavigatorKey::from_static("onboarding");

pub const ONBOARDING_STEPS: usize = 3;

/// The console's only container: a draft line the user edits with `type`.
#[derive(Debug, Default)]
pub struct ConsoleView {
    pub draft: String,
}

impl Container for ConsoleView {
    fn save_instance_state(&self) -> Option<ContainerState> {
        Some(ContainerState::build(|state| {
            state.set("draft", self.draft.as_str());
        }))
    }

    fn restore_instance_state(&mut self, state: &ContainerState) {
        self.draft = state.get("draft").unwrap_or_default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneKind {
    Page { title: String },
    Step { index: usize },
}

/// A page or an onboarding step.
pub struct ConsoleScene {
    pub kind: SceneKind,
    pub view: BasicScene<ConsoleView>,
    pub lifecycle: Lifecycle,
}

impl ConsoleScene {
    pub fn page(title: &str) -> SceneRef {
        scene_ref(Self::new(
            SceneKind::Page {
                title: title.to_string(),
            },
            None,
        ))
    }

    pub fn step(index: usize) -> SceneRef {
        scene_ref(Self::new(SceneKind::Step { index }, None))
    }

    fn new(kind: SceneKind, state: Option<&SceneState>) -> Self {
        Self {
            kind,
            view: BasicScene::restored(state),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn label(&self) -> String {
        match &self.kind {
            SceneKind::Page { title } => title.clone(),
            SceneKind::Step { index } => format!("step {}/{}", index + 1, ONBOARDING_STEPS),
        }
    }
}

impl Scene for ConsoleScene {
    fn key(&self) -> SceneKey {
        match self.kind {
            SceneKind::Page { .. } => PAGE,
            SceneKind::Step { .. } => ONBOARDING_STEP,
        }
    }

    fn on_start(&mut self) {
        if self.lifecycle.start() {
            log::debug!("{} started", self.label());
        }
    }

    fn on_stop(&mut self) {
        if self.lifecycle.stop() {
            log::debug!("{} stopped", self.label());
        }
    }

    fn on_destroy(&mut self) {
        if self.lifecycle.destroy() {
            log::debug!("{} destroyed", self.label());
        }
    }

    fn saveable(&self) -> Option<&dyn SaveableScene> {
        Some(self)
    }
}

impl SaveableScene for ConsoleScene {
    fn save_instance_state(&self) -> SceneState {
        let mut state = self.view.save_instance_state();
        match &self.kind {
            SceneKind::Page { title } => state.set("title", title.as_str()),
            SceneKind::Step { index } => state.set("index", *index),
        }
        state
    }
}

/// Label of a console scene, or its key for anything else.
pub fn label(scene: &SceneRef) -> String {
    let scene = scene.borrow();
    match scene.downcast_ref::<ConsoleScene>() {
        Some(console) => console.label(),
        None => scene.key().to_string(),
    }
}

/// Runs `f` on the view bookkeeping of a console scene.
pub fn with_view<R>(
    scene: &SceneRef,
    f: impl FnOnce(&mut BasicScene<ConsoleView>) -> R,
) -> Option<R> {
    let mut scene = scene.borrow_mut();
    scene
        .downcast_mut::<ConsoleScene>()
        .map(|console| f(&mut console.view))
}

fn onboarding_step(index: usize) -> Option<SceneRef> {
    (index < ONBOARDING_STEPS).then(|| ConsoleScene::step(index))
}

/// Builds and rebuilds everything the console shows.
pub struct ConsoleFactory {
    logger: Rc<dyn Logger>,
}

impl ConsoleFactory {
    pub fn new(logger: Rc<dyn Logger>) -> Self {
        Self { logger }
    }

    pub fn pages(&self, title: &str) -> Result<Rc<StackNavigator>, NavigatorError> {
        StackNavigator::builder(PAGES)
            .logger(self.logger.clone())
            .build(|| vec![ConsoleScene::page(title)])
    }

    pub fn onboarding(&self) -> Result<Rc<WizardNavigator>, NavigatorError> {
        WizardNavigator::builder(ONBOARDING, onboarding_step)
            .logger(self.logger.clone())
            .build()
    }
}

impl SceneFactory for ConsoleFactory {
    fn instantiate_scene(
        &self,
        key: &SceneKey,
        state: Option<&SceneState>,
    ) -> Result<SceneRef, NavigatorError> {
        let kind = if *key == PAGE {
            SceneKind::Page {
                title: state
                    .and_then(|s| s.get("title"))
                    .unwrap_or_else(|| "untitled".to_string()),
            }
        } else if *key == ONBOARDING_STEP {
            SceneKind::Step {
                index: state.and_then(|s| s.get("index")).unwrap_or_default(),
            }
        } else {
            return Err(NavigatorError::UnknownScene(key.clone()));
        };
        Ok(scene_ref(ConsoleScene::new(kind, state)))
    }
}

impl NavigatorFactory for ConsoleFactory {
    fn instantiate_navigator(
        &self,
        key: &NavigatorKey,
        state: Option<&NavigatorState>,
    ) -> Result<NavigatorRef, NavigatorError> {
        if *key == PAGES {
            let navigator = StackNavigator::builder(PAGES)
                .restore(state, self)
                .logger(self.logger.clone())
                .build(|| vec![ConsoleScene::page("home")])?;
            Ok(navigator)
        } else if *key == ONBOARDING {
            let navigator = WizardNavigator::builder(ONBOARDING, onboarding_step)
                .restore(state, self)
                .logger(self.logger.clone())
                .build()?;
            Ok(navigator)
        } else {
            Err(NavigatorError::UnknownNavigator(key.clone()))
        }
    }
}
