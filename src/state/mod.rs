//! # Saved State
//!
//! The ordered key/value container navigators and scenes use to persist
//! themselves across process death.
//!
//! ```text
//! NavigatorState
//! ├── "size": Int(2)
//! ├── "active_index": Int(1)
//! ├── "0_class": Str("pages")
//! ├── "0_state": State(NavigatorState { .. })
//! ├── "1_class": Str("onboarding")
//! └── "1_state": State(NavigatorState { .. })
//! ```
//!
//! Keys are kept sorted, so two containers built from the same entries compare
//! equal no matter which order the entries were written in. Lists keep their
//! element order.
//!
//! The concrete persistence format is a host concern. The container itself
//! only needs get/set/remove by key and equality; `to_json`/`from_json` give
//! hosts a ready-made codec.

mod value;

pub use value::{FromStateValue, StateValue};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered, string-keyed container of [`StateValue`]s.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct SavedState {
    entries: BTreeMap<String, StateValue>,
}

/// Saved state of a navigator.
pub type NavigatorState = SavedState;

/// Saved state of a scene.
pub type SceneState = SavedState;

/// Saved state of a container (view-local state such as field values).
pub type ContainerState = SavedState;

impl SavedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a container by handing a fresh instance to `f`.
    ///
    /// ```rust,ignore
    /// let state = SavedState::build(|s| {
    ///     s.set("size", 1);
    ///     s.set("0_class", "pages");
    /// });
    /// ```
    pub fn build(f: impl FnOnce(&mut SavedState)) -> Self {
        let mut state = Self::new();
        f(&mut state);
        state
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StateValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Stores `value` under `key` when present, removes the key otherwise.
    pub fn set_optional(&mut self, key: impl Into<String>, value: Option<impl Into<StateValue>>) {
        let key = key.into();
        match value {
            Some(value) => {
                self.entries.insert(key, value.into());
            }
            None => {
                self.entries.remove(&key);
            }
        }
    }

    /// Typed lookup. Returns `None` when the key is absent or holds a value of
    /// another type.
    pub fn get<T: FromStateValue>(&self, key: &str) -> Option<T> {
        self.entries.get(key).and_then(T::from_state_value)
    }

    /// Borrowed lookup of a nested container.
    pub fn get_state(&self, key: &str) -> Option<&SavedState> {
        match self.entries.get(key) {
            Some(StateValue::State(state)) => Some(state),
            _ => None,
        }
    }

    pub fn get_value(&self, key: &str) -> Option<&StateValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<StateValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for SavedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "}}")
    }
}
