use super::signal::{CompletionSignal, Report};
use crate::cancel::{CancelHook, Cancellable};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::rc::Rc;

use tracing::{debug, trace, warn};

/// The expected shape of a fan-in: positional or named slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape<K> {
    /// `n` slots addressed by index.
    Sequence(usize),
    /// One slot per distinct key.
    Keyed(Vec<K>),
}

/// Results of a fan-in whose every slot succeeded, shaped like its [`Shape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate<K, T> {
    /// Values in slot order, regardless of arrival order.
    Sequence(Vec<T>),
    Keyed(BTreeMap<K, T>),
}

impl<K, T> Aggregate<K, T> {
    pub fn len(&self) -> usize {
        match self {
            Aggregate::Sequence(values) => values.len(),
            Aggregate::Keyed(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_sequence(self) -> Option<Vec<T>> {
        match self {
            Aggregate::Sequence(values) => Some(values),
            Aggregate::Keyed(_) => None,
        }
    }

    pub fn into_keyed(self) -> Option<BTreeMap<K, T>> {
        match self {
            Aggregate::Keyed(values) => Some(values),
            Aggregate::Sequence(_) => None,
        }
    }
}

/// What the parent callback of a fan-in receives, exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<K, T, E> {
    /// Every slot reported a value.
    Completed(Aggregate<K, T>),
    /// A slot reported an error before the others completed.
    Errored(E),
    /// A slot reported a completion signal before the others completed.
    Signalled(CompletionSignal),
}

impl<K, T, E> Outcome<K, T, E> {
    /// Splits the outcome into the aggregate or what interrupted the group.
    pub fn into_result(self) -> Result<Aggregate<K, T>, Interrupted<E>> {
        match self {
            Outcome::Completed(aggregate) => Ok(aggregate),
            Outcome::Errored(err) => Err(Interrupted::Error(err)),
            Outcome::Signalled(signal) => Err(Interrupted::Signal(signal)),
        }
    }
}

/// Why a fan-in stopped before every slot reported a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupted<E> {
    Error(E),
    Signal(CompletionSignal),
}

type ParentCallback<K, T, E> = Box<dyn FnOnce(Outcome<K, T, E>)>;

/// Aggregate state, owned by the combinator and touched only by its
/// slot callbacks and its cancel handle.
struct State<K, T, E> {
    /// `None` for a sequence shape.
    keys: Option<Vec<K>>,

    /// One-way latch: set once the parent was served or the group was cancelled.
    completed: bool,

    completed_count: usize,
    results: Vec<Option<T>>,
    hooks: Vec<CancelHook>,
    parent: Option<ParentCallback<K, T, E>>,
}

type SharedState<K, T, E> = Rc<RefCell<State<K, T, E>>>;

/// Latches the group and fires every slot's cancel hook once.
///
/// Returns `false` if the group had already settled. Hooks run after the
/// state borrow is released, so they may report into sibling slots.
fn cancel_all<K, T, E>(state: &SharedState<K, T, E>) -> bool {
    let hooks = {
        let mut state = state.borrow_mut();
        if state.completed {
            return false;
        }
        state.completed = true;

        state.hooks.iter_mut().map(mem::take).collect::<Vec<_>>()
    };

    for mut hook in hooks {
        hook.fire();
    }

    true
}

/// The callback handed to one child slot.
///
/// Cloning yields another handle to the same slot.
pub struct SlotCallback<K, T, E> {
    index: usize,
    state: SharedState<K, T, E>,
}

impl<K: Ord, T, E> SlotCallback<K, T, E> {
    /// Position of the slot (key order for keyed shapes).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Delivers this slot's report.
    ///
    /// Ignored once the group has settled. A value completes the slot; an
    /// error or completion signal cancels every slot and is forwarded to
    /// the parent as-is.
    pub fn report(&self, report: Report<T, E>) {
        let outcome = match report {
            Report::Value(value) => self.record(value),
            Report::Error(err) => self.short_circuit(Outcome::Errored(err)),
            Report::Signal(signal) => self.short_circuit(Outcome::Signalled(signal)),
        };

        let Some(outcome) = outcome else {
            return;
        };

        let parent = self.state.borrow_mut().parent.take();
        if let Some(parent) = parent {
            parent(outcome);
        }
    }

    /// Shorthand for `report(Report::Value(value))`.
    pub fn succeed(&self, value: T) {
        self.report(Report::Value(value));
    }

    /// Shorthand for `report(Report::Error(err))`.
    pub fn fail(&self, err: E) {
        self.report(Report::Error(err));
    }

    fn record(&self, value: T) -> Option<Outcome<K, T, E>> {
        let mut state = self.state.borrow_mut();

        if state.completed {
            trace!(slot = self.index, "report after settlement ignored");
            return None;
        }

        if state.results[self.index].is_some() {
            warn!(slot = self.index, "slot reported twice; duplicate ignored");
            return None;
        }

        state.results[self.index] = Some(value);
        state.completed_count += 1;

        if state.completed_count < state.results.len() {
            return None;
        }

        state.completed = true;

        let values: Vec<T> = state.results.drain(..).flatten().collect();
        debug!(slots = values.len(), "fan-in completed");

        let aggregate = match state.keys.take() {
            None => Aggregate::Sequence(values),
            Some(keys) => Aggregate::Keyed(keys.into_iter().zip(values).collect()),
        };

        Some(Outcome::Completed(aggregate))
    }

    fn short_circuit(&self, outcome: Outcome<K, T, E>) -> Option<Outcome<K, T, E>> {
        if !cancel_all(&self.state) {
            trace!(slot = self.index, "report after settlement ignored");
            return None;
        }

        debug!(slot = self.index, "fan-in short-circuited");
        Some(outcome)
    }

    /// Substitutes the slot's cancellation capability.
    ///
    /// The default capability does nothing. The hook runs at most once,
    /// when the group is cancelled or this slot is cancelled directly.
    pub fn set_cancel(&self, hook: impl FnOnce() + 'static) {
        self.state.borrow_mut().hooks[self.index] = CancelHook::new(hook);
    }
}

impl<K, T, E> Cancellable for SlotCallback<K, T, E> {
    /// Runs this slot's cancellation capability only.
    fn cancel(&self) {
        let mut hook = mem::take(&mut self.state.borrow_mut().hooks[self.index]);
        hook.fire();
    }
}

impl<K, T, E> Clone for SlotCallback<K, T, E> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            state: self.state.clone(),
        }
    }
}

impl<K, T, E> fmt::Debug for SlotCallback<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotCallback")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// The combinator's own cancellation capability.
///
/// Cancelling latches the group (the parent will never be called) and
/// runs every slot's cancellation capability once. Cancelling a settled
/// group does nothing.
pub struct CancelHandle<K, T, E> {
    state: SharedState<K, T, E>,
}

impl<K, T, E> CancelHandle<K, T, E> {
    /// Whether the group completed, short-circuited or was cancelled.
    pub fn is_settled(&self) -> bool {
        self.state.borrow().completed
    }

    /// Number of slots that reported a value so far.
    pub fn completed_count(&self) -> usize {
        self.state.borrow().completed_count
    }
}

impl<K, T, E> Cancellable for CancelHandle<K, T, E> {
    fn cancel(&self) {
        if cancel_all(&self.state) {
            debug!("fan-in cancelled");

            let parent = self.state.borrow_mut().parent.take();
            drop(parent);
        }
    }
}

impl<K, T, E> Clone for CancelHandle<K, T, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<K, T, E> fmt::Debug for CancelHandle<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("settled", &self.is_settled())
            .field("completed_count", &self.completed_count())
            .finish()
    }
}

/// Slot callbacks keyed like the [`Shape`] they were built from.
pub enum Slots<K, T, E> {
    Sequence(Vec<SlotCallback<K, T, E>>),
    Keyed(BTreeMap<K, SlotCallback<K, T, E>>),
}

/// A fan-in over a fixed set of child slots.
///
/// Built by [`build_combinator`]. Both "wait for all" and "race" fall out
/// of the same mechanism: the group completes when every slot reports a
/// value and short-circuits on the first error or completion signal.
///
/// All state lives on one thread; slot callbacks must be invoked from the
/// thread that built the combinator.
pub struct Combinator<K, T, E> {
    handle: CancelHandle<K, T, E>,
    slots: Vec<SlotCallback<K, T, E>>,
    keys: Option<Vec<K>>,
}

impl<T: 'static, E: 'static> Combinator<usize, T, E> {
    /// Builds a fan-in over `len` positional slots.
    pub fn sequence(len: usize, parent: impl FnOnce(Outcome<usize, T, E>) + 'static) -> Self {
        build_combinator(Shape::Sequence(len), parent)
    }
}

impl<K: Ord + Clone + 'static, T: 'static, E: 'static> Combinator<K, T, E> {
    /// Builds a fan-in with one slot per distinct key.
    pub fn keyed(
        keys: impl IntoIterator<Item = K>,
        parent: impl FnOnce(Outcome<K, T, E>) + 'static,
    ) -> Self {
        build_combinator(Shape::Keyed(keys.into_iter().collect()), parent)
    }

    /// Slot callback for `key`, for keyed shapes.
    pub fn slot_for(&self, key: &K) -> Option<&SlotCallback<K, T, E>> {
        let index = self.keys.as_ref()?.binary_search(key).ok()?;
        self.slots.get(index)
    }
}

impl<K, T, E> Combinator<K, T, E> {
    /// Slot callback at `index` (key order for keyed shapes).
    pub fn slot(&self, index: usize) -> Option<&SlotCallback<K, T, E>> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn cancel_handle(&self) -> CancelHandle<K, T, E> {
        self.handle.clone()
    }

    /// Splits the combinator into its cancel handle and shaped slots.
    pub fn into_parts(self) -> (CancelHandle<K, T, E>, Slots<K, T, E>)
    where
        K: Ord,
    {
        let slots = match self.keys {
            None => Slots::Sequence(self.slots),
            Some(keys) => Slots::Keyed(keys.into_iter().zip(self.slots).collect()),
        };

        (self.handle, slots)
    }
}

impl<K, T, E> Cancellable for Combinator<K, T, E> {
    fn cancel(&self) {
        self.handle.cancel();
    }
}

/// Builds a fan-in combinator for `shape`.
///
/// `parent` is called exactly once: with the aggregate when every slot
/// reported a value, or with the first error or completion signal. It is
/// never called if the group is cancelled through its [`CancelHandle`].
///
/// An empty shape is a programmer error and trips a debug assertion; in
/// release builds the parent is simply never called.
///
/// # Examples
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use weft::combinator::{Aggregate, Combinator, Outcome};
///
/// let seen = Rc::new(RefCell::new(None));
/// let sink = seen.clone();
/// let fan = Combinator::<usize, i32, String>::sequence(2, move |outcome| {
///     *sink.borrow_mut() = Some(outcome);
/// });
///
/// fan.slot(1).unwrap().succeed(20);
/// fan.slot(0).unwrap().succeed(10);
///
/// assert_eq!(
///     *seen.borrow(),
///     Some(Outcome::Completed(Aggregate::Sequence(vec![10, 20])))
/// );
/// ```
pub fn build_combinator<K, T, E>(
    shape: Shape<K>,
    parent: impl FnOnce(Outcome<K, T, E>) + 'static,
) -> Combinator<K, T, E>
where
    K: Ord + Clone + 'static,
    T: 'static,
    E: 'static,
{
    let (total, keys) = match shape {
        Shape::Sequence(len) => (len, None),
        Shape::Keyed(mut keys) => {
            keys.sort();
            keys.dedup();
            (keys.len(), Some(keys))
        }
    };

    debug_assert!(total > 0, "build_combinator: got an empty sequence or mapping");

    let state = Rc::new(RefCell::new(State {
        keys: keys.clone(),
        completed: false,
        completed_count: 0,
        results: (0..total).map(|_| None).collect(),
        hooks: (0..total).map(|_| CancelHook::noop()).collect(),
        parent: Some(Box::new(parent) as ParentCallback<K, T, E>),
    }));

    let slots = (0..total)
        .map(|index| SlotCallback {
            index,
            state: state.clone(),
        })
        .collect();

    Combinator {
        handle: CancelHandle { state },
        slots,
        keys,
    }
}
