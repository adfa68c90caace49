use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use downcast_rs::{Downcast, impl_downcast};

use super::error::NavigatorError;
use super::event::{Listener, ListenerHandle};
use crate::presentation::{SceneKey, SceneRef};
use crate::state::{NavigatorState, SceneState};

/// Stable identifier of a kind of navigator, written into saved state so a
/// parent can rebuild its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavigatorKey(Cow<'static, str>);

impl NavigatorKey {
    pub const fn from_static(key: &'static str) -> Self {
        NavigatorKey(Cow::Borrowed(key))
    }

    pub fn new(key: impl Into<String>) -> Self {
        NavigatorKey(Cow::Owned(key.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NavigatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A state machine that decides which scene is active.
///
/// The host (or a parent navigator) drives `on_start`, `on_stop` and
/// `on_destroy`; the navigator drives its own scenes and children and reports
/// back through listeners. All methods take `&self` so listeners may call
/// back into the navigator while it is notifying them.
pub trait Navigator: Downcast {
    fn key(&self) -> &NavigatorKey;

    /// Registers `listener`. When the navigator is active the listener
    /// immediately receives the current scene without transition data.
    fn add_listener(&self, listener: Listener) -> ListenerHandle;

    fn on_start(&self);

    fn on_stop(&self);

    fn on_destroy(&self);

    fn is_destroyed(&self) -> bool;

    /// Returns the back-press capability for navigators that have one.
    fn back_press_handler(&self) -> Option<&dyn BackPressHandler> {
        None
    }

    /// Returns the save capability for navigators that can persist themselves.
    fn saveable(&self) -> Option<&dyn SaveableNavigator> {
        None
    }
}

impl_downcast!(Navigator);

/// Shared handle to a navigator.
pub type NavigatorRef = Rc<dyn Navigator>;

/// Capability of navigators that react to the host's back signal.
pub trait BackPressHandler {
    /// Returns `true` when the back press was consumed.
    fn on_back_pressed(&self) -> bool;
}

/// Capability of navigators whose state survives process death.
pub trait SaveableNavigator {
    fn save_instance_state(&self) -> NavigatorState;
}

/// Rebuilds scenes from saved state.
///
/// Only consulted while restoring. The factory must recognise every key its
/// navigator can produce; an unknown key is a programming error and fails the
/// restore.
pub trait SceneFactory {
    fn instantiate_scene(
        &self,
        key: &SceneKey,
        state: Option<&SceneState>,
    ) -> Result<SceneRef, NavigatorError>;
}

impl<F> SceneFactory for F
where
    F: Fn(&SceneKey, Option<&SceneState>) -> Result<SceneRef, NavigatorError>,
{
    fn instantiate_scene(
        &self,
        key: &SceneKey,
        state: Option<&SceneState>,
    ) -> Result<SceneRef, NavigatorError> {
        self(key, state)
    }
}

/// Rebuilds child navigators from saved state. Same contract as
/// [`SceneFactory`].
pub trait NavigatorFactory {
    fn instantiate_navigator(
        &self,
        key: &NavigatorKey,
        state: Option<&NavigatorState>,
    ) -> Result<NavigatorRef, NavigatorError>;
}

impl<F> NavigatorFactory for F
where
    F: Fn(&NavigatorKey, Option<&NavigatorState>) -> Result<NavigatorRef, NavigatorError>,
{
    fn instantiate_navigator(
        &self,
        key: &NavigatorKey,
        state: Option<&NavigatorState>,
    ) -> Result<NavigatorRef, NavigatorError> {
        self(key, state)
    }
}
