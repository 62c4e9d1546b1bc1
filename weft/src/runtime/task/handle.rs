use super::core::{Header, Output};
use crate::cancel::Cancellable;
use crate::error::{Error, Result, internal_err};
use crate::id::TaskId;
use crate::task::Task;

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use tracing::debug;

/// A handle to a spawned task.
///
/// `JoinHandle` is a future resolving to the task's output, or to
/// [`Error::Cancelled`] if the task was aborted first.
///
/// Dropping the handle does **not** cancel the task; it only discards
/// the ability to observe its result. Call [`abort`](Self::abort) to stop it.
pub struct JoinHandle<T> {
    pub(crate) header: Rc<Header>,
    pub(crate) output: Rc<RefCell<Output<T>>>,
}

impl<T> JoinHandle<T> {
    pub fn id(&self) -> TaskId {
        self.header.id
    }

    /// Whether the task ran to completion.
    pub fn is_finished(&self) -> bool {
        self.header.finished.get()
    }

    /// Aborts the task.
    ///
    /// The task's future is dropped on the runtime's next turn without
    /// being polled again. Aborting a finished or already aborted task
    /// does nothing.
    pub fn abort(&self) {
        if !self.header.is_running() {
            return;
        }

        self.header.aborted.set(true);
        debug!(task = %self.header.id, "task aborted");

        self.header.waker.wake_by_ref();

        if let Some(waiter) = self.output.borrow_mut().waiter.take() {
            waiter.wake();
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut output = self.output.borrow_mut();

        if let Some(value) = output.value.take() {
            return Poll::Ready(Ok(value));
        }

        if self.header.finished.get() {
            return Poll::Ready(Err(internal_err(format!(
                "join handle of {} polled after its output was taken",
                self.header.id
            ))));
        }

        if self.header.aborted.get() {
            return Poll::Ready(Err(Error::Cancelled));
        }

        output.waiter = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<T> Cancellable for JoinHandle<T> {
    fn cancel(&self) {
        self.abort();
    }
}

/// A join handle is a real task: it reports its own lifecycle.
///
/// Awaiting the handle moves the output out, after which
/// [`result`](Task::result) returns `None`.
impl<T: Clone> Task for JoinHandle<T> {
    type Output = T;
    type Error = Error;

    fn is_running(&self) -> bool {
        self.header.is_running()
    }

    fn result(&self) -> Option<T> {
        self.output.borrow().value.clone()
    }

    fn error(&self) -> Option<Error> {
        self.header.aborted.get().then_some(Error::Cancelled)
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle")
            .field("header", &self.header)
            .finish()
    }
}
