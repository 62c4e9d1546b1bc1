use super::core::{Shared, TimerHandle};

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// The runtime currently driving this thread.
    ///
    /// Set for the duration of `block_on` so that `spawn` and `delay`
    /// can find the runtime without explicit parameter passing.
    static CURRENT: RefCell<Option<Rc<Shared>>> = const { RefCell::new(None) };
}

/// Restores the previous context when dropped, including on unwind.
struct ContextGuard {
    previous: Option<Rc<Shared>>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|cell| cell.replace(previous));
    }
}

/// Installs `shared` as the current runtime while `f` runs.
pub(crate) fn enter_context<R>(shared: Rc<Shared>, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT.with(|cell| cell.replace(Some(shared)));
    let _guard = ContextGuard { previous };

    f()
}

/// Returns the runtime driving this thread, if any.
pub(crate) fn current() -> Option<Rc<Shared>> {
    CURRENT.with(|cell| cell.borrow().clone())
}

/// Returns a timer handle for the runtime driving this thread, if any.
pub(crate) fn current_timer() -> Option<TimerHandle> {
    current().map(TimerHandle::new)
}
