//! # Operation Scheduling
//!
//! One navigator operation runs to completion before the next begins. That
//! includes every start, stop and destroy it causes further down the
//! hierarchy.
//!
//! ```text
//!   host ── push ──► run ─┬─► effects ─► listener ── pop ──► deferred
//!                         │                                    │
//!                         └─► done ─► drain deferred ◄─────────┘
//! ```
//!
//! Operations requested while another one is running (from a listener, a
//! scene callback or a composite reacting to a finished child) wait in a
//! FIFO and run once the current operation is done. Lifecycle calls a
//! parent makes on its children are part of the parent's operation and run
//! immediately.
//!
//! Navigators are single-threaded (`Rc`), so the scheduler is per thread.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Weak;

type Work = Box<dyn FnOnce()>;

#[derive(Default)]
struct Scheduler {
    running: Cell<bool>,
    deferred: RefCell<VecDeque<Work>>,
}

thread_local! {
    static SCHEDULER: Scheduler = Scheduler::default();
}

/// Marks the outermost operation. Dropping it (also on unwind) leaves the
/// scheduler idle with nothing deferred.
struct Running;

impl Drop for Running {
    fn drop(&mut self) {
        let leftover = SCHEDULER.with(|s| {
            s.running.set(false);
            std::mem::take(&mut *s.deferred.borrow_mut())
        });
        drop(leftover);
    }
}

/// Runs `work` now. Outside any operation it becomes the current operation,
/// and everything deferred meanwhile runs right after it.
pub(crate) fn run(work: impl FnOnce()) {
    let outermost = SCHEDULER.with(|s| !s.running.replace(true));
    if !outermost {
        work();
        return;
    }
    let _running = Running;
    work();
    while let Some(next) = SCHEDULER.with(|s| s.deferred.borrow_mut().pop_front()) {
        next();
    }
}

/// Runs `work` on `target` now when idle, otherwise after the current
/// operation and anything deferred before it. Skipped when `target` has been
/// dropped by then.
pub(crate) fn request<T: 'static>(target: &Weak<T>, work: impl FnOnce(&T) + 'static) {
    let target = target.clone();
    let work = move || {
        if let Some(target) = target.upgrade() {
            work(&target);
        }
    };
    if is_running() {
        SCHEDULER.with(|s| s.deferred.borrow_mut().push_back(Box::new(work)));
    } else {
        run(work);
    }
}

pub(crate) fn is_running() -> bool {
    SCHEDULER.with(|s| s.running.get())
}
