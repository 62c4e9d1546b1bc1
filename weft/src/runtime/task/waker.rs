use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Wake, Waker};
use std::thread::Thread;

/// Run queue shared between the runtime and every waker it hands out.
///
/// Wakers may be invoked from any thread, so the queue is synchronized
/// even though tasks themselves only ever run on the runtime thread.
#[derive(Default)]
pub(crate) struct ReadyQueue {
    /// Slab keys of tasks that were woken.
    tasks: Mutex<VecDeque<usize>>,

    /// Set when the future passed to `block_on` was woken.
    main: AtomicBool,

    /// Thread currently driving the runtime, unparked on every wake.
    driver: Mutex<Option<Thread>>,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, VecDeque<usize>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, key: usize) {
        self.tasks().push_back(key);
        self.unpark();
    }

    pub(crate) fn pop(&self) -> Option<usize> {
        self.tasks().pop_front()
    }

    pub(crate) fn notify_main(&self) {
        self.main.store(true, Ordering::Release);
        self.unpark();
    }

    /// Clears the main flag, returning whether it was set.
    pub(crate) fn take_main(&self) -> bool {
        self.main.swap(false, Ordering::AcqRel)
    }

    /// Whether nothing is waiting to be polled.
    pub(crate) fn is_idle(&self) -> bool {
        !self.main.load(Ordering::Acquire) && self.tasks().is_empty()
    }

    pub(crate) fn set_driver(&self, thread: Option<Thread>) {
        *self.driver.lock().unwrap_or_else(PoisonError::into_inner) = thread;
    }

    fn unpark(&self) {
        if let Some(thread) = &*self.driver.lock().unwrap_or_else(PoisonError::into_inner) {
            thread.unpark();
        }
    }
}

/// Waker of a spawned task: re-queues the task's slab key.
struct TaskWaker {
    key: usize,
    ready: Arc<ReadyQueue>,
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.ready.push(self.key);
    }
}

/// Waker of the future driven by `block_on`.
struct MainWaker {
    ready: Arc<ReadyQueue>,
}

impl Wake for MainWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.ready.notify_main();
    }
}

pub(crate) fn task_waker(key: usize, ready: Arc<ReadyQueue>) -> Waker {
    Waker::from(Arc::new(TaskWaker { key, ready }))
}

pub(crate) fn main_waker(ready: Arc<ReadyQueue>) -> Waker {
    Waker::from(Arc::new(MainWaker { ready }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_waker_queues_key() {
        let ready = Arc::new(ReadyQueue::new());
        let waker = task_waker(3, ready.clone());

        assert!(ready.is_idle());
        waker.wake_by_ref();
        waker.wake();

        assert_eq!(ready.pop(), Some(3));
        assert_eq!(ready.pop(), Some(3));
        assert_eq!(ready.pop(), None);
    }

    #[test]
    fn main_waker_sets_flag() {
        let ready = Arc::new(ReadyQueue::new());
        main_waker(ready.clone()).wake();

        assert!(!ready.is_idle());
        assert!(ready.take_main());
        assert!(!ready.take_main());
    }
}
