use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use downcast_rs::{Downcast, impl_downcast};

use crate::state::SceneState;

/// Stable identifier of a kind of scene.
///
/// Restoration looks scenes up by this key, so it must survive renames and
/// process restarts. Use a fixed tag, never a type name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneKey(Cow<'static, str>);

impl SceneKey {
    pub const fn from_static(key: &'static str) -> Self {
        SceneKey(Cow::Borrowed(key))
    }

    pub fn new(key: impl Into<String>) -> Self {
        SceneKey(Cow::Owned(key.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of presentation logic with a lifecycle.
///
/// Only the owning navigator calls the lifecycle methods. Implementations
/// that embed a [`Lifecycle`](super::Lifecycle) get the "nothing happens after
/// destroy" guarantee for free.
pub trait Scene: Downcast {
    fn key(&self) -> SceneKey;

    fn on_start(&mut self) {}

    fn on_stop(&mut self) {}

    fn on_destroy(&mut self) {}

    /// Returns the save capability for scenes that can persist themselves.
    fn saveable(&self) -> Option<&dyn SaveableScene> {
        None
    }
}

impl_downcast!(Scene);

/// Capability of scenes whose state survives process death.
///
/// The returned state is handed back to the navigator's scene factory on
/// restore.
pub trait SaveableScene {
    fn save_instance_state(&self) -> SceneState;
}

/// Shared handle to a scene. Navigators own scenes through these; listeners
/// receive clones.
pub type SceneRef = Rc<RefCell<dyn Scene>>;

/// Wraps a concrete scene into a [`SceneRef`].
pub fn scene_ref(scene: impl Scene) -> SceneRef {
    Rc::new(RefCell::new(scene))
}

/// Identity comparison of two scene handles.
pub fn same_scene(a: &SceneRef, b: &SceneRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

pub(crate) fn describe(scene: &SceneRef) -> String {
    match scene.try_borrow() {
        Ok(scene) => scene.key().to_string(),
        Err(_) => "<busy>".to_string(),
    }
}
