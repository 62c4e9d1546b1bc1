//! Core runtime components.
//!
//! The runtime is a single-threaded cooperative scheduler. It is
//! responsible for:
//! - storing and polling spawned tasks,
//! - driving the timer queue behind [`delay`](crate::time::delay),
//! - providing the thread-local context used by `spawn` and `delay`,
//! - enabling cooperative multitasking via yielding.
//!
//! Nothing here creates OS threads; all state is touched from the thread
//! calling [`Runtime::block_on`].

mod core;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod task;
pub(crate) mod yield_now;

pub use self::core::{Runtime, TimerHandle};
