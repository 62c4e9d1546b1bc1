use super::JoinHandle;
use crate::id::TaskId;
use crate::runtime::context;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::Waker;

/// Type-erased future stored by the runtime.
pub(crate) type LocalFuture = Pin<Box<dyn Future<Output = ()>>>;

/// Lifecycle flags shared between a task and its [`JoinHandle`].
pub(crate) struct Header {
    pub(crate) id: TaskId,

    /// The task's future returned `Poll::Ready`.
    pub(crate) finished: Cell<bool>,

    /// The task was aborted; its future is dropped on the next turn.
    pub(crate) aborted: Cell<bool>,

    /// Waker that re-queues this task.
    pub(crate) waker: Waker,
}

impl Header {
    pub(crate) fn new(id: TaskId, waker: Waker) -> Self {
        Self {
            id,
            finished: Cell::new(false),
            aborted: Cell::new(false),
            waker,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.finished.get() && !self.aborted.get()
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("id", &self.id)
            .field("finished", &self.finished.get())
            .field("aborted", &self.aborted.get())
            .finish()
    }
}

/// Where a task's result waits for its [`JoinHandle`].
pub(crate) struct Output<T> {
    pub(crate) value: Option<T>,
    pub(crate) waiter: Option<Waker>,
}

impl<T> Default for Output<T> {
    fn default() -> Self {
        Self {
            value: None,
            waiter: None,
        }
    }
}

/// A spawned task as stored in the runtime slab.
///
/// The future is taken out of the slot while it is being polled so the
/// slab is never borrowed across a poll; a task can therefore spawn or
/// abort other tasks freely.
pub(crate) struct TaskSlot {
    pub(crate) header: Rc<Header>,
    pub(crate) future: Option<LocalFuture>,
}

/// Wraps `future` so its output lands in `output` and the join waiter is woken.
pub(crate) fn bind<F>(
    future: F,
    header: Rc<Header>,
    output: Rc<RefCell<Output<F::Output>>>,
) -> LocalFuture
where
    F: Future + 'static,
    F::Output: 'static,
{
    Box::pin(async move {
        let value = future.await;
        header.finished.set(true);

        let waiter = {
            let mut output = output.borrow_mut();
            output.value = Some(value);
            output.waiter.take()
        };

        if let Some(waiter) = waiter {
            waiter.wake();
        }
    })
}

/// Spawns a future as a task onto the current runtime.
///
/// The task is queued and first polled on the runtime's next turn, never
/// inline. The future does not need to be `Send`: every task runs on the
/// thread driving the runtime.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime. See
/// [`try_spawn`] for a fallible version.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    let shared =
        context::current().expect("spawn must be called within the context of a runtime");
    shared.spawn(future)
}

/// Like [`spawn`], but returns [`Error::OutsideRuntime`](crate::Error::OutsideRuntime)
/// instead of panicking.
pub fn try_spawn<F>(future: F) -> crate::Result<JoinHandle<F::Output>>
where
    F: Future + 'static,
    F::Output: 'static,
{
    context::current()
        .map(|shared| shared.spawn(future))
        .ok_or(crate::Error::OutsideRuntime("spawn"))
}
