use crate::cancel::Cancellable;
use crate::id::IdSource;

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use tracing::trace;

/// Callback invoked when a scheduled timer fires.
pub type TimerCallback = Box<dyn FnOnce()>;

/// The timer capability used by [`delay_on`](super::delay_on).
///
/// Implementations must never invoke `callback` from inside `schedule`;
/// it fires on a later scheduler turn at the earliest.
pub trait Timer {
    /// Schedules `callback` to run once `after` has elapsed.
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerKey;

    /// Clears a scheduled timer. Safe to call after the timer fired.
    fn cancel(&self, key: &TimerKey) {
        key.cancel();
    }
}

/// Handle to a scheduled timer.
///
/// The key is cleared exactly once, either when the timer fires or when
/// it is cancelled; whichever comes second is a no-op.
#[derive(Clone)]
pub struct TimerKey {
    id: u64,
    cleared: Arc<AtomicBool>,
}

impl TimerKey {
    /// Creates an armed key. Exposed so custom [`Timer`]s can hand out keys.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            cleared: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the timer is still waiting to fire.
    pub fn is_pending(&self) -> bool {
        !self.cleared.load(AtomicOrdering::Acquire)
    }

    /// Clears the key, returning `true` if it was still pending.
    ///
    /// Timers call this right before firing; only a caller that observes
    /// `true` may run the callback.
    pub fn clear(&self) -> bool {
        !self.cleared.swap(true, AtomicOrdering::AcqRel)
    }
}

impl Cancellable for TimerKey {
    fn cancel(&self) {
        self.clear();
    }
}

impl fmt::Debug for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerKey")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// An entry in the timer queue.
///
/// Entries are stored in a `BinaryHeap`, ordered so that the earliest
/// deadline pops first and entries sharing a deadline pop in the order
/// they were scheduled.
struct TimerEntry {
    deadline: Instant,
    key: TimerKey,
    callback: TimerCallback,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.key.id == other.key.id
    }
}

impl Ord for TimerEntry {
    /// Reversed so the max-heap behaves as a min-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.key.id.cmp(&self.key.id))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deadline-ordered queue of pending timers, driven by the runtime.
///
/// Cancelled entries stay in the heap until they reach the top, where
/// they are discarded without running.
#[derive(Default)]
pub(crate) struct TimerQueue {
    heap: RefCell<BinaryHeap<TimerEntry>>,
    ids: IdSource,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerKey {
        let key = TimerKey::new(self.ids.next_id());
        let deadline = Instant::now() + after;

        trace!(timer = key.id, ?after, "timer scheduled");

        self.heap.borrow_mut().push(TimerEntry {
            deadline,
            key: key.clone(),
            callback,
        });

        key
    }

    /// Fires every entry whose deadline is at or before `now`.
    ///
    /// The heap is not borrowed while a callback runs, so callbacks may
    /// schedule further timers. Returns the number of callbacks run.
    pub(crate) fn fire_expired(&self, now: Instant) -> usize {
        let mut fired = 0;

        loop {
            let entry = {
                let mut heap = self.heap.borrow_mut();
                match heap.peek() {
                    Some(top) if top.deadline <= now => heap.pop(),
                    _ => None,
                }
            };

            let Some(entry) = entry else {
                return fired;
            };

            if entry.key.clear() {
                trace!(timer = entry.key.id, "timer fired");
                (entry.callback)();
                fired += 1;
            }
        }
    }

    /// Deadline of the earliest entry that is still pending.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        let mut heap = self.heap.borrow_mut();

        while let Some(top) = heap.peek() {
            if top.key.is_pending() {
                return Some(top.deadline);
            }
            heap.pop();
        }

        None
    }

    /// Drops every entry without running it.
    pub(crate) fn clear(&self) {
        let entries = std::mem::take(&mut *self.heap.borrow_mut());
        for entry in &entries {
            entry.key.clear();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.borrow().len()
    }
}
