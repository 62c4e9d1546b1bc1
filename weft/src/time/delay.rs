use super::timer::{Timer, TimerKey};
use crate::cancel::Cancellable;
use crate::deferred::{Awaitable, Settler, deferred};
use crate::error::{Error, Result};
use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Creates a delay on the current runtime's timer that resolves with `value`.
///
/// The timer is scheduled immediately. Even with a zero duration the delay
/// never resolves before the runtime's next turn, so a cancellation issued
/// in the same turn always wins.
///
/// # Panics
///
/// Panics if called outside of a running runtime. Use [`delay_on`] with an
/// explicit [`Timer`] to avoid the ambient lookup.
///
/// # Examples
///
/// ```rust,ignore
/// let value = delay(Duration::from_millis(10), "done").await?;
/// ```
pub fn delay<T: 'static>(duration: Duration, value: T) -> Delay<T> {
    let timer = context::current_timer()
        .expect("delay must be called within the context of a runtime");
    delay_on(&timer, duration, value)
}

/// [`delay`] with the conventional `true` value.
pub fn delay_true(duration: Duration) -> Delay<bool> {
    delay(duration, true)
}

/// Creates a delay driven by `timer`.
pub fn delay_on<T: 'static>(timer: &impl Timer, duration: Duration, value: T) -> Delay<T> {
    let (settler, awaitable, ()) = deferred::<T, Error>().into_parts();

    let fire = settler.clone();
    let key = timer.schedule(
        duration,
        Box::new(move || {
            fire.settle(value);
        }),
    );

    Delay {
        awaitable,
        canceller: DelayCanceller { key, settler },
    }
}

/// A timed awaitable with an explicit cancel operation.
///
/// Resolves with the delayed value once the timer fires, or with
/// [`Error::Cancelled`] if [`cancel`](Cancellable::cancel) runs first.
/// Cancelling after the timer fired changes nothing.
///
/// Dropping an unfired `Delay` cancels it: its timer never fires and any
/// [`awaitable`](Self::awaitable) taken from it resolves with
/// [`Error::Cancelled`].
pub struct Delay<T> {
    awaitable: Awaitable<T, Error>,
    canceller: DelayCanceller<T>,
}

impl<T> Delay<T> {
    /// Returns a detached handle that can cancel this delay.
    pub fn canceller(&self) -> DelayCanceller<T> {
        self.canceller.clone()
    }

    /// Returns the awaitable side, shareable between several waiters.
    pub fn awaitable(&self) -> Awaitable<T, Error> {
        self.awaitable.clone()
    }

    /// Whether the delay has resolved or been cancelled.
    pub fn is_settled(&self) -> bool {
        self.awaitable.is_settled()
    }
}

impl<T> Cancellable for Delay<T> {
    fn cancel(&self) {
        self.canceller.cancel();
    }
}

impl<T> Drop for Delay<T> {
    fn drop(&mut self) {
        self.canceller.cancel();
    }
}

impl<T: Clone> Future for Delay<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().awaitable).poll(cx)
    }
}

/// The cancellation capability of a [`Delay`].
pub struct DelayCanceller<T> {
    key: TimerKey,
    settler: Settler<T, Error>,
}

impl<T> Clone for DelayCanceller<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            settler: self.settler.clone(),
        }
    }
}

impl<T> Cancellable for DelayCanceller<T> {
    fn cancel(&self) {
        if self.key.clear() {
            self.settler.fail(Error::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimerCallback;

    use std::cell::RefCell;

    /// A timer that only fires when the test says so.
    #[derive(Default)]
    struct ManualTimer {
        pending: RefCell<Vec<(TimerKey, TimerCallback)>>,
    }

    impl ManualTimer {
        fn fire_all(&self) {
            let pending = std::mem::take(&mut *self.pending.borrow_mut());
            for (key, callback) in pending {
                if key.clear() {
                    callback();
                }
            }
        }
    }

    impl Timer for ManualTimer {
        fn schedule(&self, _after: Duration, callback: TimerCallback) -> TimerKey {
            let key = TimerKey::new(self.pending.borrow().len() as u64);
            self.pending.borrow_mut().push((key.clone(), callback));
            key
        }
    }

    #[test]
    fn resolves_with_value_when_fired() {
        let timer = ManualTimer::default();
        let delay = delay_on(&timer, Duration::from_millis(5), 11);

        assert!(!delay.is_settled());
        timer.fire_all();

        assert_eq!(delay.awaitable().try_result(), Some(Ok(11)));
    }

    #[test]
    fn cancel_before_fire_never_yields_value() {
        let timer = ManualTimer::default();
        let delay = delay_on(&timer, Duration::from_millis(5), "late");

        delay.cancel();
        timer.fire_all();

        assert_eq!(delay.awaitable().try_result(), Some(Err(Error::Cancelled)));
    }

    #[test]
    fn cancel_after_fire_is_noop() {
        let timer = ManualTimer::default();
        let delay = delay_on(&timer, Duration::ZERO, 1u8);
        let canceller = delay.canceller();

        timer.fire_all();
        canceller.cancel();
        canceller.cancel();

        assert_eq!(delay.awaitable().try_result(), Some(Ok(1)));
    }

    #[test]
    fn dropping_unfired_delay_clears_its_timer() {
        let timer = ManualTimer::default();
        let delay = delay_on(&timer, Duration::from_millis(5), "dropped");
        let awaitable = delay.awaitable();

        drop(delay);

        assert!(!timer.pending.borrow()[0].0.is_pending());
        assert_eq!(awaitable.try_result(), Some(Err(Error::Cancelled)));
    }

    #[test]
    fn dropping_fired_delay_keeps_value() {
        let timer = ManualTimer::default();
        let delay = delay_on(&timer, Duration::ZERO, 4);
        let awaitable = delay.awaitable();

        timer.fire_all();
        drop(delay);

        assert_eq!(awaitable.try_result(), Some(Ok(4)));
    }
}
