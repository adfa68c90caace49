//! Bookkeeping shared by the composite navigators.

use std::rc::{Rc, Weak};

use crate::core::logger::Logger;
use crate::navigation::effect::ChildEffect;
use crate::navigation::event::{ListenerHandle, NavigatorEvent, TransitionData};
use crate::navigation::saved::{self, SavedList};
use crate::navigation::{NavigatorError, NavigatorFactory, NavigatorKey, NavigatorRef};
use crate::state::NavigatorState;

/// A child navigator together with the composite's subscription to it.
///
/// `id` identifies the child in event callbacks; it is unique within one
/// composite.
#[derive(Clone)]
pub(super) struct Child {
    pub(super) id: u64,
    pub(super) navigator: NavigatorRef,
    pub(super) subscription: ListenerHandle,
}

impl Child {
    /// Subscribes `owner` to `navigator`'s events. Events arriving after the
    /// owner is dropped are discarded.
    pub(super) fn subscribe<T: 'static>(
        owner: &Weak<T>,
        id: u64,
        navigator: NavigatorRef,
        on_event: fn(&T, u64, &NavigatorEvent),
    ) -> Child {
        let owner = owner.clone();
        let subscription = navigator.add_listener(Rc::new(move |event: &NavigatorEvent| {
            if let Some(owner) = owner.upgrade() {
                on_event(&owner, id, event);
            }
        }));
        Child {
            id,
            navigator,
            subscription,
        }
    }

    pub(super) fn unsubscribe(&self) -> ChildEffect {
        ChildEffect::Unsubscribe(self.subscription.clone())
    }

    pub(super) fn stop(&self) -> ChildEffect {
        ChildEffect::Stop(self.navigator.clone())
    }

    pub(super) fn destroy(&self) -> ChildEffect {
        ChildEffect::Destroy(self.navigator.clone())
    }

    pub(super) fn start(&self, transition: Option<TransitionData>) -> ChildEffect {
        ChildEffect::Start(self.navigator.clone(), transition)
    }

    /// `(class, state)` for the saved layout.
    pub(super) fn saved_entry(&self) -> (String, Option<NavigatorState>) {
        (
            self.navigator.key().to_string(),
            self.navigator
                .saveable()
                .map(|saveable| saveable.save_instance_state()),
        )
    }
}

/// Rebuilds the saved children through `factory`. `Ok(None)` means the saved
/// state was unusable and the caller should fall back to its initial content.
pub(super) fn restore_children(
    tag: &str,
    key: &NavigatorKey,
    saved: &NavigatorState,
    factory: &dyn NavigatorFactory,
    logger: &dyn Logger,
) -> Result<Option<(Vec<NavigatorRef>, usize)>, NavigatorError> {
    let Some(SavedList {
        entries,
        active_index,
    }) = saved::read(saved)
    else {
        logger.warn(
            tag,
            &format!("{key}: saved state is missing or corrupt, using initial children"),
        );
        return Ok(None);
    };
    let children = entries
        .iter()
        .map(|entry| factory.instantiate_navigator(&NavigatorKey::new(entry.class.clone()), entry.state))
        .collect::<Result<Vec<_>, _>>()?;
    logger.debug(tag, &format!("{key}: restored {} children", children.len()));
    Ok(Some((children, active_index)))
}
