//! The cancellation capability.
//!
//! Anything that can be told to stop early implements [`Cancellable`]:
//! delays, join handles, timer keys and fan-in combinators. Callers
//! dispatch on the trait instead of probing values for a cancel hook.

use std::fmt;

/// A value that can be cancelled.
///
/// Implementations must be idempotent: cancelling twice has the same
/// observable effect as cancelling once.
pub trait Cancellable {
    fn cancel(&self);
}

/// A one-shot cancellation callback.
///
/// The default hook does nothing. [`fire`](Self::fire) consumes the
/// callback, so a hook runs at most once no matter how often it is fired.
#[derive(Default)]
pub struct CancelHook {
    callback: Option<Box<dyn FnOnce()>>,
}

impl CancelHook {
    /// A hook that does nothing when fired.
    pub fn noop() -> Self {
        Self::default()
    }

    /// A hook that runs `f` the first time it is fired.
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self {
            callback: Some(Box::new(f)),
        }
    }

    /// Runs the callback if it has not run yet.
    pub fn fire(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }

    /// Whether a callback is still waiting to run.
    pub fn is_armed(&self) -> bool {
        self.callback.is_some()
    }
}

impl fmt::Debug for CancelHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHook")
            .field("armed", &self.is_armed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn hook_fires_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut hook = CancelHook::new(move || counter.set(counter.get() + 1));

        assert!(hook.is_armed());
        hook.fire();
        hook.fire();

        assert_eq!(calls.get(), 1);
        assert!(!hook.is_armed());
    }

    #[test]
    fn noop_hook_is_inert() {
        let mut hook = CancelHook::noop();
        hook.fire();
        assert!(!hook.is_armed());
    }
}
