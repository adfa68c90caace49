use std::fmt;

use serde::{Deserialize, Serialize};

use super::SavedState;

/// A single value stored in a [`SavedState`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    State(SavedState),
    List(Vec<SavedState>),
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(b) => write!(f, "{b}"),
            StateValue::Int(i) => write!(f, "{i}"),
            StateValue::Float(x) => write!(f, "{x}"),
            StateValue::Str(s) => write!(f, "{s:?}"),
            StateValue::State(state) => write!(f, "{state}"),
            StateValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Bool(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        StateValue::Int(i64::from(value))
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        StateValue::Int(value)
    }
}

impl From<u32> for StateValue {
    fn from(value: u32) -> Self {
        StateValue::Int(i64::from(value))
    }
}

impl From<usize> for StateValue {
    fn from(value: usize) -> Self {
        // Indices and sizes never get near i64::MAX.
        StateValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        StateValue::Float(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Str(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        StateValue::Str(value)
    }
}

impl From<SavedState> for StateValue {
    fn from(value: SavedState) -> Self {
        StateValue::State(value)
    }
}

impl From<Vec<SavedState>> for StateValue {
    fn from(value: Vec<SavedState>) -> Self {
        StateValue::List(value)
    }
}

/// Typed extraction used by [`SavedState::get`].
///
/// Returns `None` on a type mismatch instead of coercing, so corrupt entries
/// are indistinguishable from missing ones.
pub trait FromStateValue: Sized {
    fn from_state_value(value: &StateValue) -> Option<Self>;
}

impl FromStateValue for bool {
    fn from_state_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromStateValue for i64 {
    fn from_state_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromStateValue for i32 {
    fn from_state_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::Int(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl FromStateValue for usize {
    fn from_state_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::Int(i) => usize::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl FromStateValue for f64 {
    fn from_state_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl FromStateValue for String {
    fn from_state_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromStateValue for SavedState {
    fn from_state_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::State(state) => Some(state.clone()),
            _ => None,
        }
    }
}

impl FromStateValue for Vec<SavedState> {
    fn from_state_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::List(items) => Some(items.clone()),
            _ => None,
        }
    }
}
