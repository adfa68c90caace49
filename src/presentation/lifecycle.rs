/// Lifecycle states shared by scenes and navigators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Created,
    Started,
    Stopped,
    Destroyed,
}

/// Tracks a scene's lifecycle and filters out calls that would break it.
///
/// Each method returns `true` when the call changed state, which is the
/// signal for the scene to run its own start/stop/destroy logic.
///
/// ```rust,ignore
/// fn on_stop(&mut self) {
///     if self.lifecycle.stop() {
///         self.pause_updates();
///     }
/// }
/// ```
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.state == LifecycleState::Started
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == LifecycleState::Destroyed
    }

    pub fn start(&mut self) -> bool {
        match self.state {
            LifecycleState::Created | LifecycleState::Stopped => {
                self.state = LifecycleState::Started;
                true
            }
            LifecycleState::Started | LifecycleState::Destroyed => false,
        }
    }

    pub fn stop(&mut self) -> bool {
        match self.state {
            LifecycleState::Started => {
                self.state = LifecycleState::Stopped;
                true
            }
            _ => false,
        }
    }

    /// Destroying a started scene implicitly stops it; the caller only sees
    /// the destroy.
    pub fn destroy(&mut self) -> bool {
        if self.state == LifecycleState::Destroyed {
            return false;
        }
        self.state = LifecycleState::Destroyed;
        true
    }
}
