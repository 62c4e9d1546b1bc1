use super::fan_in::{Combinator, Interrupted, SlotCallback};
use super::signal::{CompletionSignal, Report};
use crate::cancel::Cancellable;
use crate::deferred::{Awaitable, Settler, deferred};
use crate::task::spawn;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tracing::debug;

/// A running group of children started by [`all`] or [`all_keyed`].
///
/// Resolves with the aggregate, or with whatever interrupted the group.
/// Cancelling aborts every child still running and resolves the group
/// with [`CompletionSignal::Cancel`]; cancelling a settled group does
/// nothing. Dropping an unsettled group cancels it.
pub struct All<V, E> {
    awaitable: Awaitable<V, Interrupted<E>>,
    settler: Settler<V, Interrupted<E>>,

    /// `None` for an empty group.
    group: Option<Box<dyn Cancellable>>,
}

impl<V, E> All<V, E> {
    /// Whether the group completed, short-circuited or was cancelled.
    pub fn is_settled(&self) -> bool {
        self.awaitable.is_settled()
    }
}

impl<V, E> Cancellable for All<V, E> {
    fn cancel(&self) {
        if self.settler.is_settled() {
            return;
        }

        if let Some(group) = &self.group {
            group.cancel();
        }

        if self.settler.fail(Interrupted::Signal(CompletionSignal::Cancel)) {
            debug!("group cancelled");
        }
    }
}

impl<V: Clone, E: Clone> Future for All<V, E> {
    type Output = Result<V, Interrupted<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().awaitable).poll(cx)
    }
}

impl<V, E> Drop for All<V, E> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<V, E> fmt::Debug for All<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("All")
            .field("settled", &self.is_settled())
            .finish_non_exhaustive()
    }
}

/// Runs every child as a task and waits for all of them.
///
/// Resolves with the children's values in input order. The first child
/// to report an error or completion signal wins instead: every other
/// child is aborted and the group fails with that report.
///
/// An empty input resolves immediately with an empty vector. The returned
/// [`All`] can be cancelled, which aborts every child still running.
///
/// # Panics
///
/// Panics if called outside of a running runtime.
///
/// # Examples
///
/// ```rust
/// use weft::combinator::{Report, all};
///
/// let runtime = weft::RuntimeBuilder::new().build();
/// let values = runtime.block_on(async {
///     let children = (1..=3).map(|n| async move { Report::<u32, ()>::Value(n * 10) });
///     all(children).await
/// });
/// assert_eq!(values, Ok(vec![10, 20, 30]));
/// ```
pub fn all<T, E, F>(children: impl IntoIterator<Item = F>) -> All<Vec<T>, E>
where
    F: Future<Output = Report<T, E>> + 'static,
    T: 'static,
    E: 'static,
{
    let children: Vec<F> = children.into_iter().collect();
    let (settler, awaitable, ()) = deferred().into_parts();

    if children.is_empty() {
        settler.settle(Vec::new());
        return All {
            awaitable,
            settler,
            group: None,
        };
    }

    let parent = settler.clone();
    let fan = Combinator::<usize, T, E>::sequence(children.len(), move |outcome| {
        match outcome.into_result() {
            Ok(aggregate) => {
                if let Some(values) = aggregate.into_sequence() {
                    parent.settle(values);
                }
            }
            Err(interrupted) => {
                parent.fail(interrupted);
            }
        }
    });

    for (index, child) in children.into_iter().enumerate() {
        if let Some(slot) = fan.slot(index) {
            attach(slot, child);
        }
    }

    All {
        awaitable,
        settler,
        group: Some(Box::new(fan.cancel_handle())),
    }
}

/// [`all`] over named children; resolves with a map keyed like the input.
///
/// If a key appears more than once, the last child for it is kept.
pub fn all_keyed<K, T, E, F>(
    children: impl IntoIterator<Item = (K, F)>,
) -> All<BTreeMap<K, T>, E>
where
    K: Ord + Clone + 'static,
    F: Future<Output = Report<T, E>> + 'static,
    T: 'static,
    E: 'static,
{
    let children: BTreeMap<K, F> = children.into_iter().collect();
    let (settler, awaitable, ()) = deferred().into_parts();

    if children.is_empty() {
        settler.settle(BTreeMap::new());
        return All {
            awaitable,
            settler,
            group: None,
        };
    }

    let parent = settler.clone();
    let fan = Combinator::<K, T, E>::keyed(children.keys().cloned(), move |outcome| {
        match outcome.into_result() {
            Ok(aggregate) => {
                if let Some(values) = aggregate.into_keyed() {
                    parent.settle(values);
                }
            }
            Err(interrupted) => {
                parent.fail(interrupted);
            }
        }
    });

    for (key, child) in children {
        if let Some(slot) = fan.slot_for(&key) {
            attach(slot, child);
        }
    }

    All {
        awaitable,
        settler,
        group: Some(Box::new(fan.cancel_handle())),
    }
}

/// Spawns `child`, routes its report into `slot` and lets cancelling the
/// slot abort the spawned task.
fn attach<K, T, E, F>(slot: &SlotCallback<K, T, E>, child: F)
where
    K: Ord + 'static,
    F: Future<Output = Report<T, E>> + 'static,
    T: 'static,
    E: 'static,
{
    let reporter = slot.clone();
    let handle = spawn(async move {
        let report = child.await;
        reporter.report(report);
    });

    slot.set_cancel(move || handle.abort());
}
