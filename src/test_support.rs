//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::cell::RefCell;
use std::rc::Rc;

use log::Level;

use crate::core::logger::Logger;
use crate::navigation::{
    Listener, ListenerHandle, Navigator, NavigatorError, NavigatorEvent, NavigatorKey, SceneFactory,
};
use crate::presentation::{Lifecycle, SaveableScene, Scene, SceneKey, SceneRef, scene_ref};
use crate::state::SceneState;

/// Shared, ordered record of lifecycle calls and events.
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.borrow().clone()
}

/// A scene that records every lifecycle call as `"{name}.start"` etc.
///
/// Calls are recorded raw, before the embedded lifecycle filters them, so
/// tests catch navigators that call a scene twice.
pub struct TestScene {
    pub name: String,
    pub foo: i64,
    pub lifecycle: Lifecycle,
    log: CallLog,
    hook: Option<Rc<dyn Fn(&str)>>,
}

impl TestScene {
    pub const KEY: SceneKey = SceneKey::from_static("test_scene");

    pub fn create(name: &str, log: &CallLog) -> SceneRef {
        Self::with_foo(name, 0, log)
    }

    pub fn with_foo(name: &str, foo: i64, log: &CallLog) -> SceneRef {
        scene_ref(TestScene {
            name: name.to_string(),
            foo,
            lifecycle: Lifecycle::default(),
            log: log.clone(),
            hook: None,
        })
    }

    /// A scene that calls `hook` with `"start"`, `"stop"` or `"destroy"`
    /// after recording each lifecycle call.
    pub fn with_hook(name: &str, log: &CallLog, hook: impl Fn(&str) + 'static) -> SceneRef {
        scene_ref(TestScene {
            name: name.to_string(),
            foo: 0,
            lifecycle: Lifecycle::default(),
            log: log.clone(),
            hook: Some(Rc::new(hook)),
        })
    }

    fn record(&self, call: &str) {
        self.log.borrow_mut().push(format!("{}.{call}", self.name));
        if let Some(hook) = &self.hook {
            hook(call);
        }
    }
}

impl Scene for TestScene {
    fn key(&self) -> SceneKey {
        Self::KEY
    }

    fn on_start(&mut self) {
        self.record("start");
        self.lifecycle.start();
    }

    fn on_stop(&mut self) {
        self.record("stop");
        self.lifecycle.stop();
    }

    fn on_destroy(&mut self) {
        self.record("destroy");
        self.lifecycle.destroy();
    }

    fn saveable(&self) -> Option<&dyn SaveableScene> {
        Some(self)
    }
}

impl SaveableScene for TestScene {
    fn save_instance_state(&self) -> SceneState {
        SceneState::build(|state| {
            state.set("name", self.name.as_str());
            state.set("foo", self.foo);
        })
    }
}

/// Name of a [`TestScene`] behind a handle.
pub fn scene_name(scene: &SceneRef) -> String {
    scene
        .borrow()
        .downcast_ref::<TestScene>()
        .map(|scene| scene.name.clone())
        .unwrap_or_else(|| scene.borrow().key().to_string())
}

/// Restores [`TestScene`]s, logging into `log`.
pub fn test_scene_factory(log: &CallLog) -> impl SceneFactory + use<> {
    let log = log.clone();
    move |key: &SceneKey, state: Option<&SceneState>| -> Result<SceneRef, NavigatorError> {
        if *key != TestScene::KEY {
            return Err(NavigatorError::UnknownScene(key.clone()));
        }
        let name: String = state
            .and_then(|s| s.get("name"))
            .unwrap_or_else(|| "restored".to_string());
        let foo: i64 = state.and_then(|s| s.get("foo")).unwrap_or_default();
        Ok(TestScene::with_foo(&name, foo, &log))
    }
}

/// A listener that records events into `log` as `"scene(a, forward)"`,
/// `"scene(a, none)"` or `"finished"`.
pub fn recording_listener(log: &CallLog) -> Listener {
    let log = log.clone();
    Rc::new(move |event: &NavigatorEvent| {
        log.borrow_mut().push(describe_event(event));
    })
}

pub fn describe_event(event: &NavigatorEvent) -> String {
    match event {
        NavigatorEvent::SceneChanged { scene, transition } => {
            let direction = match transition {
                None => "none",
                Some(data) if data.is_backward() => "backward",
                Some(_) => "forward",
            };
            format!("scene({}, {direction})", scene_name(scene))
        }
        NavigatorEvent::Finished => "finished".to_string(),
    }
}

/// Registers a recording listener and returns its log.
pub fn record_events(navigator: &dyn Navigator) -> (CallLog, ListenerHandle) {
    let log = call_log();
    let handle = navigator.add_listener(recording_listener(&log));
    (log, handle)
}

/// A logger that keeps `(level, "[tag] message")` records.
#[derive(Default)]
pub struct RecordingLogger {
    pub records: RefCell<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn count(&self, level: Level) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Level, tag: &str, message: &str) {
        self.records
            .borrow_mut()
            .push((level, format!("[{tag}] {message}")));
    }
}

/// A navigator with a single scene and no back-press or save capability.
///
/// Lets composite tests observe the fallback paths taken when a child does
/// not consume back presses.
pub struct PassiveNavigator {
    key: NavigatorKey,
    scene: SceneRef,
    state: RefCell<PassiveState>,
    listeners: Rc<crate::navigation::event::ListenerRegistry>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PassiveState {
    Inactive,
    Active,
    Destroyed,
}

impl PassiveNavigator {
    pub const KEY: NavigatorKey = NavigatorKey::from_static("passive");

    pub fn create(scene: SceneRef) -> Rc<Self> {
        Rc::new(Self {
            key: Self::KEY,
            scene,
            state: RefCell::new(PassiveState::Inactive),
            listeners: crate::navigation::event::ListenerRegistry::new(),
        })
    }

    /// Finishes on the navigator's own initiative.
    pub fn finish(&self) {
        if *self.state.borrow() == PassiveState::Destroyed {
            return;
        }
        self.on_destroy_inner();
        self.listeners.notify(&NavigatorEvent::Finished);
        self.listeners.clear();
    }

    fn on_destroy_inner(&self) {
        let previous = self.state.replace(PassiveState::Destroyed);
        if previous == PassiveState::Active {
            self.scene.borrow_mut().on_stop();
        }
        if previous != PassiveState::Destroyed {
            self.scene.borrow_mut().on_destroy();
        }
    }
}

impl Navigator for PassiveNavigator {
    fn key(&self) -> &NavigatorKey {
        &self.key
    }

    fn add_listener(&self, listener: Listener) -> ListenerHandle {
        if *self.state.borrow() == PassiveState::Destroyed {
            return ListenerHandle::disposed();
        }
        let active = *self.state.borrow() == PassiveState::Active;
        let handle = self.listeners.add(listener.clone());
        if active {
            listener(&NavigatorEvent::scene_changed(self.scene.clone(), None));
        }
        handle
    }

    fn on_start(&self) {
        if *self.state.borrow() != PassiveState::Inactive {
            return;
        }
        self.state.replace(PassiveState::Active);
        self.scene.borrow_mut().on_start();
        self.listeners
            .notify(&NavigatorEvent::scene_changed(self.scene.clone(), None));
    }

    fn on_stop(&self) {
        if *self.state.borrow() != PassiveState::Active {
            return;
        }
        self.state.replace(PassiveState::Inactive);
        self.scene.borrow_mut().on_stop();
    }

    fn on_destroy(&self) {
        self.on_destroy_inner();
        self.listeners.clear();
    }

    fn is_destroyed(&self) -> bool {
        *self.state.borrow() == PassiveState::Destroyed
    }
}
