//! One-shot settlement cells.
//!
//! A [`Deferred`] bundles an [`Awaitable`] with the two capabilities that
//! can settle it (`settle` and `fail`) plus whatever extra fields the
//! caller wants to carry alongside. The awaitable exists before either
//! capability can be called, and only the first settlement has effect.

use crate::error::Error;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

/// Settlement state shared by every holder of the same cell.
enum State<T, E> {
    /// Not settled yet; wakers of tasks awaiting the cell.
    Pending(Vec<Waker>),
    Settled(Result<T, E>),
}

struct Shared<T, E> {
    state: Mutex<State<T, E>>,
}

impl<T, E> Shared<T, E> {
    fn lock(&self) -> MutexGuard<'_, State<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Settles the cell with `outcome` unless it is already settled.
    ///
    /// Returns `true` if this call performed the settlement.
    fn complete(&self, outcome: Result<T, E>) -> bool {
        let waiters = {
            let mut state = self.lock();

            match &mut *state {
                State::Settled(_) => return false,
                State::Pending(waiters) => {
                    let waiters = std::mem::take(waiters);
                    *state = State::Settled(outcome);
                    waiters
                }
            }
        };

        for waker in waiters {
            waker.wake();
        }

        true
    }
}

/// The read side of a one-shot cell.
///
/// Every clone observes the same settlement. Awaiting yields a clone of
/// the settled value, so any number of holders can await the same cell.
pub struct Awaitable<T, E = Error> {
    cell: Arc<Shared<T, E>>,
}

impl<T, E> Awaitable<T, E> {
    /// Whether the cell has been settled.
    pub fn is_settled(&self) -> bool {
        matches!(*self.cell.lock(), State::Settled(_))
    }
}

impl<T: Clone, E: Clone> Awaitable<T, E> {
    /// Returns the settlement without waiting, if there is one.
    pub fn try_result(&self) -> Option<Result<T, E>> {
        match &*self.cell.lock() {
            State::Settled(outcome) => Some(outcome.clone()),
            State::Pending(_) => None,
        }
    }
}

impl<T, E> Clone for Awaitable<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Clone, E: Clone> Future for Awaitable<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.cell.lock();

        match &mut *state {
            State::Settled(outcome) => Poll::Ready(outcome.clone()),
            State::Pending(waiters) => {
                if !waiters.iter().any(|w| w.will_wake(cx.waker())) {
                    waiters.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl<T, E> fmt::Debug for Awaitable<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Awaitable")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// The write side of a one-shot cell.
///
/// Cloning a `Settler` hands out the same capability; whichever clone
/// settles first wins and every later call is ignored.
pub struct Settler<T, E = Error> {
    cell: Arc<Shared<T, E>>,
}

impl<T, E> Settler<T, E> {
    /// Resolves the cell with `value`. Returns `false` if already settled.
    pub fn settle(&self, value: T) -> bool {
        self.cell.complete(Ok(value))
    }

    /// Rejects the cell with `err`. Returns `false` if already settled.
    pub fn fail(&self, err: E) -> bool {
        self.cell.complete(Err(err))
    }

    /// Whether the cell has been settled.
    pub fn is_settled(&self) -> bool {
        matches!(*self.cell.lock(), State::Settled(_))
    }
}

impl<T, E> Clone for Settler<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Settler<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// An awaitable bundled with the capability to settle it.
///
/// `X` holds caller-attached fields and defaults to `()`.
///
/// # Examples
///
/// ```rust
/// use weft::deferred::deferred;
///
/// let def = deferred::<u32, &str>();
/// assert!(def.settle(7));
/// assert!(!def.fail("too late"));
/// assert_eq!(def.awaitable().try_result(), Some(Ok(7)));
/// ```
pub struct Deferred<T, E = Error, X = ()> {
    settler: Settler<T, E>,
    awaitable: Awaitable<T, E>,

    /// Caller-attached fields.
    pub extra: X,
}

impl<T, E, X> Deferred<T, E, X> {
    /// Resolves the deferred. Only the first settlement has effect.
    pub fn settle(&self, value: T) -> bool {
        self.settler.settle(value)
    }

    /// Rejects the deferred. Only the first settlement has effect.
    pub fn fail(&self, err: E) -> bool {
        self.settler.fail(err)
    }

    /// Returns a handle to the awaitable side.
    pub fn awaitable(&self) -> Awaitable<T, E> {
        self.awaitable.clone()
    }

    /// Returns a handle to the settling side.
    pub fn settler(&self) -> Settler<T, E> {
        self.settler.clone()
    }

    /// Splits the deferred into its capabilities and extra fields.
    pub fn into_parts(self) -> (Settler<T, E>, Awaitable<T, E>, X) {
        (self.settler, self.awaitable, self.extra)
    }
}

impl<T, E, X: fmt::Debug> fmt::Debug for Deferred<T, E, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.settler.is_settled())
            .field("extra", &self.extra)
            .finish()
    }
}

/// Creates an unsettled deferred with no extra fields.
pub fn deferred<T, E>() -> Deferred<T, E> {
    deferred_with(())
}

/// Creates an unsettled deferred carrying `extra`.
pub fn deferred_with<T, E, X>(extra: X) -> Deferred<T, E, X> {
    let cell = Arc::new(Shared {
        state: Mutex::new(State::Pending(Vec::new())),
    });

    Deferred {
        settler: Settler { cell: cell.clone() },
        awaitable: Awaitable { cell },
        extra,
    }
}

/// Creates `len` independent deferreds.
pub fn array_of_deferred<T, E>(len: usize) -> Vec<Deferred<T, E>> {
    (0..len).map(|_| deferred()).collect()
}
