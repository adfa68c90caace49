use crate::state::{ContainerState, SceneState};

const CONTAINER_STATE_KEY: &str = "container";

/// Something a scene can present itself through: a view, a terminal pane,
/// a test double.
///
/// Containers that hold user-visible state worth keeping (typed text, scroll
/// position) override the two state hooks.
pub trait Container {
    fn save_instance_state(&self) -> Option<ContainerState> {
        None
    }

    fn restore_instance_state(&mut self, _state: &ContainerState) {}
}

/// Container bookkeeping for scenes.
///
/// Holds at most one attached container. Detaching captures the container's
/// state; the next attach re-applies it before returning, so a fresh
/// container picks up where the previous one left off.
#[derive(Debug)]
pub struct BasicScene<C> {
    container: Option<C>,
    container_state: Option<ContainerState>,
}

impl<C> Default for BasicScene<C> {
    fn default() -> Self {
        Self {
            container: None,
            container_state: None,
        }
    }
}

impl<C: Container> BasicScene<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the bookkeeping from a scene's saved state, picking up any
    /// container state captured by [`BasicScene::save_instance_state`].
    pub fn restored(state: Option<&SceneState>) -> Self {
        Self {
            container: None,
            container_state: state.and_then(|s| s.get::<ContainerState>(CONTAINER_STATE_KEY)),
        }
    }

    /// Attaches `container`, detaching the current one first.
    pub fn attach(&mut self, mut container: C) -> Option<C> {
        let previous = self.detach();
        if let Some(state) = &self.container_state {
            container.restore_instance_state(state);
        }
        self.container = Some(container);
        previous
    }

    /// Detaches and returns the attached container, capturing its state.
    pub fn detach(&mut self) -> Option<C> {
        let container = self.container.take()?;
        if let Some(state) = container.save_instance_state() {
            self.container_state = Some(state);
        }
        Some(container)
    }

    pub fn container(&self) -> Option<&C> {
        self.container.as_ref()
    }

    pub fn container_mut(&mut self) -> Option<&mut C> {
        self.container.as_mut()
    }

    pub fn is_attached(&self) -> bool {
        self.container.is_some()
    }

    /// Scene state holding the latest container state, read from the attached
    /// container when there is one.
    pub fn save_instance_state(&self) -> SceneState {
        let mut state = SceneState::new();
        let current = self
            .container
            .as_ref()
            .and_then(Container::save_instance_state)
            .or_else(|| self.container_state.clone());
        state.set_optional(CONTAINER_STATE_KEY, current);
        state
    }
}
