//! Tasks and the task capability.
//!
//! [`Task`] is the capability surrounding code uses to observe a unit of
//! work: whether it is still running and how it ended. Runtime tasks
//! ([`JoinHandle`]) implement it, and so does [`MockTask`], which lets
//! tests script arbitrary lifecycles without a scheduler.

mod mock;

pub use crate::runtime::task::{JoinHandle, spawn, try_spawn};
pub use crate::runtime::yield_now::yield_now;
pub use mock::{MockTask, create_mock_task};

/// The capability of a task-like value.
///
/// Once `is_running` returns `false`, at most one of `result` and `error`
/// is expected to be `Some`; implementations are not required to enforce it.
pub trait Task {
    type Output;
    type Error;

    fn is_running(&self) -> bool;

    /// The value the task completed with, if any.
    fn result(&self) -> Option<Self::Output>;

    /// The error the task failed with, if any.
    fn error(&self) -> Option<Self::Error>;
}
