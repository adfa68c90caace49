//! Navigator events, transition metadata and listener bookkeeping.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::presentation::SceneRef;
use crate::presentation::scene::describe;

/// Direction of a scene change, for hosts that pick animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Metadata attached to a scene change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionData {
    pub direction: Direction,
}

impl TransitionData {
    pub const FORWARD: TransitionData = TransitionData {
        direction: Direction::Forward,
    };

    pub const BACKWARD: TransitionData = TransitionData {
        direction: Direction::Backward,
    };

    pub fn is_backward(&self) -> bool {
        self.direction == Direction::Backward
    }
}

/// Everything a host can observe from a navigator.
#[derive(Clone)]
pub enum NavigatorEvent {
    /// `scene` is now the active scene. `transition` is `None` when the scene
    /// became visible without navigating (navigator started, listener added).
    SceneChanged {
        scene: SceneRef,
        transition: Option<TransitionData>,
    },
    /// The navigator has nothing left to show and is destroyed.
    Finished,
}

impl NavigatorEvent {
    pub fn scene_changed(scene: SceneRef, transition: Option<TransitionData>) -> Self {
        NavigatorEvent::SceneChanged { scene, transition }
    }

    pub fn scene(&self) -> Option<&SceneRef> {
        match self {
            NavigatorEvent::SceneChanged { scene, .. } => Some(scene),
            NavigatorEvent::Finished => None,
        }
    }

    pub fn transition(&self) -> Option<TransitionData> {
        match self {
            NavigatorEvent::SceneChanged { transition, .. } => *transition,
            NavigatorEvent::Finished => None,
        }
    }
}

impl fmt::Debug for NavigatorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigatorEvent::SceneChanged { scene, transition } => f
                .debug_struct("SceneChanged")
                .field("scene", &describe(scene))
                .field("transition", transition)
                .finish(),
            NavigatorEvent::Finished => f.write_str("Finished"),
        }
    }
}

/// A navigator listener.
pub type Listener = Rc<dyn Fn(&NavigatorEvent)>;

/// Registration list behind [`Navigator::add_listener`](super::Navigator::add_listener).
///
/// Delivery iterates a snapshot and re-checks membership before each call:
/// a listener that removes itself (or another listener) mid-delivery neither
/// breaks the loop nor receives anything after its removal.
///
/// A new listener awaits its replay until it receives any event. A replay
/// reaching a listener that already heard something is dropped.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: RefCell<Vec<(u64, Listener)>>,
    awaiting_replay: RefCell<Vec<u64>>,
    next_id: Cell<u64>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub(crate) fn add(self: &Rc<Self>, listener: Listener) -> ListenerHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        self.awaiting_replay.borrow_mut().push(id);
        ListenerHandle {
            registry: Rc::downgrade(self),
            id,
        }
    }

    pub(crate) fn notify(&self, event: &NavigatorEvent) {
        let snapshot: Vec<(u64, Listener)> = self.listeners.borrow().clone();
        for (id, listener) in snapshot {
            if self.contains(id) {
                self.settle(id);
                listener(event);
            }
        }
    }

    /// Tells the listener behind `handle` that `active` is the active scene,
    /// unless it was removed or has received an event since it was added.
    /// `None` only ends the wait.
    pub(crate) fn replay(&self, handle: &ListenerHandle, active: Option<SceneRef>) {
        if !self.settle(handle.id) {
            return;
        }
        let listener = self
            .listeners
            .borrow()
            .iter()
            .find(|(id, _)| *id == handle.id)
            .map(|(_, listener)| listener.clone());
        if let (Some(listener), Some(scene)) = (listener, active) {
            listener(&NavigatorEvent::scene_changed(scene, None));
        }
    }

    pub(crate) fn clear(&self) {
        self.listeners.borrow_mut().clear();
        self.awaiting_replay.borrow_mut().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn contains(&self, id: u64) -> bool {
        self.listeners.borrow().iter().any(|(i, _)| *i == id)
    }

    fn remove(&self, id: u64) {
        self.listeners.borrow_mut().retain(|(i, _)| *i != id);
        self.settle(id);
    }

    /// Returns whether `id` was still awaiting its replay.
    fn settle(&self, id: u64) -> bool {
        let mut awaiting = self.awaiting_replay.borrow_mut();
        let before = awaiting.len();
        awaiting.retain(|awaiting| *awaiting != id);
        awaiting.len() != before
    }
}

/// Returned by `add_listener`; disposing it stops delivery to that listener.
///
/// Dropping the handle does not unregister the listener.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    registry: Weak<ListenerRegistry>,
    id: u64,
}

impl ListenerHandle {
    /// A handle for a listener that was never registered, e.g. because the
    /// navigator was already destroyed.
    pub fn disposed() -> Self {
        Self {
            registry: Weak::new(),
            id: 0,
        }
    }

    pub fn dispose(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.registry
            .upgrade()
            .is_none_or(|registry| !registry.contains(self.id))
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestScene, call_log};

    fn counting(counter: &Rc<Cell<u32>>) -> Listener {
        let counter = counter.clone();
        Rc::new(move |_: &NavigatorEvent| counter.set(counter.get() + 1))
    }

    #[test]
    fn test_notify_reaches_every_listener() {
        let registry = ListenerRegistry::new();
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        registry.add(counting(&a));
        registry.add(counting(&b));

        registry.notify(&NavigatorEvent::Finished);

        assert_eq!((a.get(), b.get()), (1, 1));
    }

    #[test]
    fn test_disposed_listener_is_not_notified() {
        let registry = ListenerRegistry::new();
        let count = Rc::new(Cell::new(0));
        let handle = registry.add(counting(&count));

        handle.dispose();
        registry.notify(&NavigatorEvent::Finished);

        assert_eq!(count.get(), 0);
        assert!(handle.is_disposed());
    }

    #[test]
    fn test_listener_can_dispose_itself_during_delivery() {
        let registry = ListenerRegistry::new();
        let slot: Rc<RefCell<Option<ListenerHandle>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let self_removing: Listener = {
            let slot = slot.clone();
            let calls = calls.clone();
            Rc::new(move |_: &NavigatorEvent| {
                calls.set(calls.get() + 1);
                if let Some(handle) = slot.borrow().as_ref() {
                    handle.dispose();
                }
            })
        };
        *slot.borrow_mut() = Some(registry.add(self_removing));
        let other = Rc::new(Cell::new(0));
        registry.add(counting(&other));

        registry.notify(&NavigatorEvent::Finished);
        registry.notify(&NavigatorEvent::Finished);

        assert_eq!(calls.get(), 1);
        assert_eq!(other.get(), 2);
    }

    #[test]
    fn test_replay_reaches_only_listeners_that_heard_nothing() {
        let scene = TestScene::create("a", &call_log());
        let registry = ListenerRegistry::new();
        let early = Rc::new(Cell::new(0));
        let early_handle = registry.add(counting(&early));
        registry.notify(&NavigatorEvent::Finished);
        let late = Rc::new(Cell::new(0));
        let late_handle = registry.add(counting(&late));

        registry.replay(&early_handle, Some(scene.clone()));
        registry.replay(&late_handle, Some(scene.clone()));
        registry.replay(&late_handle, Some(scene));

        assert_eq!((early.get(), late.get()), (1, 1));
    }

    #[test]
    fn test_replay_to_disposed_listener_is_dropped() {
        let registry = ListenerRegistry::new();
        let count = Rc::new(Cell::new(0));
        let handle = registry.add(counting(&count));

        handle.dispose();
        registry.replay(&handle, Some(TestScene::create("a", &call_log())));

        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_replay_without_active_scene_ends_the_wait() {
        let registry = ListenerRegistry::new();
        let count = Rc::new(Cell::new(0));
        let handle = registry.add(counting(&count));

        registry.replay(&handle, None);
        registry.replay(&handle, Some(TestScene::create("a", &call_log())));

        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_listener_removed_by_earlier_listener_is_skipped() {
        let registry = ListenerRegistry::new();
        let victim_handle: Rc<RefCell<Option<ListenerHandle>>> = Rc::new(RefCell::new(None));

        let remover: Listener = {
            let victim_handle = victim_handle.clone();
            Rc::new(move |_: &NavigatorEvent| {
                if let Some(handle) = victim_handle.borrow().as_ref() {
                    handle.dispose();
                }
            })
        };
        registry.add(remover);
        let victim = Rc::new(Cell::new(0));
        *victim_handle.borrow_mut() = Some(registry.add(counting(&victim)));

        registry.notify(&NavigatorEvent::Finished);

        assert_eq!(victim.get(), 0);
    }

    #[test]
    fn test_handle_outliving_registry_reports_disposed() {
        let registry = ListenerRegistry::new();
        let handle = registry.add(Rc::new(|_: &NavigatorEvent| {}));
        drop(registry);
        assert!(handle.is_disposed());
        handle.dispose();
    }

    #[test]
    fn test_disposed_handle_constructor() {
        assert!(ListenerHandle::disposed().is_disposed());
    }

    #[test]
    fn test_transition_constants() {
        assert!(TransitionData::BACKWARD.is_backward());
        assert!(!TransitionData::FORWARD.is_backward());
    }
}
