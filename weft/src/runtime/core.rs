use super::builder::Config;
use super::context::enter_context;
use super::task::waker::{ReadyQueue, main_waker, task_waker};
use super::task::{Header, JoinHandle, Output, TaskSlot, bind};
use crate::id::{IdSource, TaskId};
use crate::time::{Timer, TimerCallback, TimerKey, TimerQueue};
use crate::utils::Slab;

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

/// State shared by the runtime, its timer handles and the thread-local context.
pub(crate) struct Shared {
    tasks: RefCell<Slab<TaskSlot>>,
    ready: Arc<ReadyQueue>,
    timers: TimerQueue,
    ids: IdSource,
    config: Config,
}

impl Shared {
    fn new(config: Config) -> Self {
        Self {
            tasks: RefCell::new(Slab::with_capacity(64)),
            ready: Arc::new(ReadyQueue::new()),
            timers: TimerQueue::new(),
            ids: IdSource::new(config.id_seed),
            config,
        }
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let id = TaskId::next(&self.ids);
        let output = Rc::new(RefCell::new(Output::default()));

        let (key, header) = {
            let mut tasks = self.tasks.borrow_mut();
            let key = tasks.vacant_key();
            let header = Rc::new(Header::new(id, task_waker(key, self.ready.clone())));

            let slot = TaskSlot {
                header: header.clone(),
                future: Some(bind(future, header.clone(), output.clone())),
            };
            let inserted = tasks.insert(slot);
            debug_assert_eq!(inserted, key);

            (key, header)
        };

        self.ready.push(key);
        debug!(task = %id, "task spawned");

        JoinHandle { header, output }
    }

    /// Polls the task stored at `key` once.
    fn run_task(&self, key: usize) {
        let taken = {
            let mut tasks = self.tasks.borrow_mut();
            tasks
                .get_mut(key)
                .and_then(|slot| Some((slot.header.clone(), slot.future.take()?)))
        };

        // Stale wake-up: the task already finished or is being polled.
        let Some((header, mut future)) = taken else {
            return;
        };

        if header.aborted.get() {
            self.release(key);
            drop(future);
            return;
        }

        let waker = header.waker.clone();
        let mut cx = Context::from_waker(&waker);

        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                self.release(key);
                debug!(task = %header.id, "task completed");
            }
            Poll::Pending if header.aborted.get() => {
                self.release(key);
                drop(future);
            }
            Poll::Pending => {
                if let Some(slot) = self.tasks.borrow_mut().get_mut(key) {
                    slot.future = Some(future);
                }
            }
        }
    }

    /// Frees the slab slot of a task, dropping it outside the borrow.
    fn release(&self, key: usize) {
        let slot = self.tasks.borrow_mut().remove(key);
        drop(slot);
    }

    /// Runs one scheduler turn: ready tasks first, then expired timers.
    fn turn(&self) {
        let mut polled = 0;

        while polled < self.config.event_interval {
            let Some(key) = self.ready.pop() else {
                break;
            };
            self.run_task(key);
            polled += 1;
        }

        let fired = self.timers.fire_expired(Instant::now());
        trace!(polled, fired, "turn");
    }

    /// Parks the driving thread until the next timer is due or a waker fires.
    fn park(&self) {
        let timeout = match self.timers.next_deadline() {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(self.config.max_park),
            None => self.config.max_park,
        };

        if !timeout.is_zero() {
            thread::park_timeout(timeout);
        }
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.ready.set_driver(Some(thread::current()));

        let mut future = pin!(future);
        let waker = main_waker(self.ready.clone());
        let mut cx = Context::from_waker(&waker);

        self.ready.notify_main();

        let output = loop {
            if self.ready.take_main() {
                if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                    break output;
                }
            }

            self.turn();

            if self.ready.is_idle() {
                self.park();
            }
        };

        self.ready.set_driver(None);
        output
    }

    fn shutdown(&self) {
        let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        drop(tasks);
        self.timers.clear();
    }
}

/// The runtime handle.
///
/// `Runtime` is a single-threaded cooperative scheduler: every task,
/// timer callback and fan-in reaction runs on the thread that calls
/// [`block_on`](Self::block_on), one at a time. It is responsible for:
/// - spawning tasks,
/// - driving them and the future passed to `block_on` to completion,
/// - firing timers scheduled through [`Runtime::timer`] or [`delay`](crate::time::delay).
///
/// Dropping the runtime drops every unfinished task and pending timer.
pub struct Runtime {
    shared: Rc<Shared>,
}

impl Runtime {
    pub(crate) fn new(config: Config) -> Self {
        debug!(?config, "runtime created");

        Self {
            shared: Rc::new(Shared::new(config)),
        }
    }

    /// Spawns a future onto the runtime.
    ///
    /// The task does not make progress until the runtime is driven by
    /// [`block_on`](Self::block_on).
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.shared.spawn(future)
    }

    /// Runs a future to completion on the current thread.
    ///
    /// While the future runs, the runtime context is installed so that
    /// [`spawn`](crate::task::spawn) and [`delay`](crate::time::delay)
    /// find this runtime.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let runtime = weft::RuntimeBuilder::new().build();
    /// let result = runtime.block_on(async { 42 });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        enter_context(self.shared.clone(), || self.shared.block_on(future))
    }

    /// Returns a handle to this runtime's timer queue.
    pub fn timer(&self) -> TimerHandle {
        TimerHandle::new(self.shared.clone())
    }

    /// Number of spawned tasks that have not finished yet.
    pub fn active_tasks(&self) -> usize {
        self.shared.tasks.borrow().len()
    }

    /// Number of timers still queued, including cancelled ones not yet discarded.
    pub fn queued_timers(&self) -> usize {
        self.shared.timers.len()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.shared.config)
            .field("active_tasks", &self.active_tasks())
            .finish()
    }
}

/// A [`Timer`] backed by a runtime's timer queue.
///
/// Callbacks fire on the runtime's turns, never inside [`schedule`](Timer::schedule).
#[derive(Clone)]
pub struct TimerHandle {
    shared: Rc<Shared>,
}

impl TimerHandle {
    pub(crate) fn new(shared: Rc<Shared>) -> Self {
        Self { shared }
    }
}

impl Timer for TimerHandle {
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerKey {
        self.shared.timers.schedule(after, callback)
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle").finish_non_exhaustive()
    }
}
