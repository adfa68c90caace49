//! The `{size, active_index, "{i}_class", "{i}_state"}` layout shared by every
//! navigator that saves an ordered list of scenes or children.

use crate::state::{NavigatorState, SavedState, StateValue};

const SIZE: &str = "size";
const ACTIVE_INDEX: &str = "active_index";

fn class_key(index: usize) -> String {
    format!("{index}_class")
}

fn state_key(index: usize) -> String {
    format!("{index}_state")
}

/// One saved element: its class identifier and optional state.
pub(crate) struct SavedEntry<'a> {
    pub(crate) class: String,
    pub(crate) state: Option<&'a SavedState>,
}

/// A validated saved list.
pub(crate) struct SavedList<'a> {
    pub(crate) entries: Vec<SavedEntry<'a>>,
    pub(crate) active_index: usize,
}

/// Reads the layout back. Returns `None` when anything is missing, has the
/// wrong type, or is out of range, so callers can fall back to their initial
/// content.
pub(crate) fn read(state: &NavigatorState) -> Option<SavedList<'_>> {
    let size: usize = state.get(SIZE)?;
    let active_index: usize = state.get(ACTIVE_INDEX)?;
    if size == 0 || active_index >= size {
        return None;
    }

    let entries = (0..size)
        .map(move |index| {
            let class: String = state.get(&class_key(index))?;
            let saved = match state.get_value(&state_key(index)) {
                None => None,
                Some(StateValue::State(saved)) => Some(saved),
                Some(_) => return None,
            };
            Some(SavedEntry {
                class,
                state: saved,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    Some(SavedList {
        entries,
        active_index,
    })
}

/// Writes `(class, state)` pairs in order.
pub(crate) fn write(
    entries: impl IntoIterator<Item = (String, Option<SavedState>)>,
    active_index: usize,
) -> NavigatorState {
    let mut state = NavigatorState::new();
    let mut size = 0;
    for (index, (class, saved)) in entries.into_iter().enumerate() {
        state.set(class_key(index), class);
        state.set_optional(state_key(index), saved);
        size = index + 1;
    }
    state.set(SIZE, size);
    state.set(ACTIVE_INDEX, active_index);
    state
}
