use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing source of correlation identifiers.
///
/// Every component that needs ids owns its own `IdSource`; the runtime
/// keeps one for task ids and the timer queue keeps one for ordering
/// entries that share a deadline.
///
/// The first id handed out is `seed + 1`.
#[derive(Debug, Default)]
pub struct IdSource {
    last: AtomicU64,
}

impl IdSource {
    /// Creates a source whose first id will be `seed + 1`.
    pub const fn new(seed: u64) -> Self {
        Self {
            last: AtomicU64::new(seed),
        }
    }

    /// Returns the next id.
    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the most recently issued id (or the seed if none was issued).
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

/// Identifier of a task spawned onto a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next(source: &IdSource) -> Self {
        Self(source.next_id())
    }

    /// Returns the raw numeric id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_after_seed() {
        let ids = IdSource::new(41);
        assert_eq!(ids.next_id(), 42);
        assert_eq!(ids.next_id(), 43);
        assert_eq!(ids.last(), 43);
    }

    #[test]
    fn independent_sources_do_not_share_state() {
        let a = IdSource::default();
        let b = IdSource::default();

        a.next_id();
        a.next_id();

        assert_eq!(b.next_id(), 1);
        assert_eq!(TaskId::next(&a).to_string(), "task-3");
    }
}
