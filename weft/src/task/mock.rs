use super::Task;

use std::cell::{Cell, RefCell};
use std::fmt;

/// A scripted [`Task`] for tests.
///
/// Starts running with neither result nor error. Every field has a
/// direct setter and nothing is validated, so tests can reproduce
/// contradictory states (e.g. a result and an error at once) on purpose.
///
/// # Examples
///
/// ```rust
/// use weft::task::{MockTask, Task};
///
/// let task = MockTask::<u32, String>::new();
/// task.set_running(false);
/// task.set_result(3);
///
/// assert!(!task.is_running());
/// assert_eq!(task.result(), Some(3));
/// ```
pub struct MockTask<T, E> {
    running: Cell<bool>,
    result: RefCell<Option<T>>,
    error: RefCell<Option<E>>,
}

impl<T, E> MockTask<T, E> {
    pub fn new() -> Self {
        Self {
            running: Cell::new(true),
            result: RefCell::new(None),
            error: RefCell::new(None),
        }
    }

    pub fn set_running(&self, running: bool) {
        self.running.set(running);
    }

    pub fn set_result(&self, result: T) {
        *self.result.borrow_mut() = Some(result);
    }

    pub fn set_error(&self, error: E) {
        *self.error.borrow_mut() = Some(error);
    }
}

impl<T, E> Default for MockTask<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, E: Clone> Task for MockTask<T, E> {
    type Output = T;
    type Error = E;

    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn result(&self) -> Option<T> {
        self.result.borrow().clone()
    }

    fn error(&self) -> Option<E> {
        self.error.borrow().clone()
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for MockTask<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTask")
            .field("running", &self.running.get())
            .field("result", &self.result.borrow())
            .field("error", &self.error.borrow())
            .finish()
    }
}

/// Creates a running [`MockTask`].
pub fn create_mock_task<T, E>() -> MockTask<T, E> {
    MockTask::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running_and_empty() {
        let task = create_mock_task::<i32, String>();

        assert!(task.is_running());
        assert_eq!(task.result(), None);
        assert_eq!(task.error(), None);
    }

    #[test]
    fn scripted_failure() {
        let task = MockTask::<i32, &str>::new();
        task.set_running(false);
        task.set_error("boom");

        assert!(!task.is_running());
        assert_eq!(task.error(), Some("boom"));
        assert_eq!(task.result(), None);
    }

    #[test]
    fn contradictory_state_is_not_rejected() {
        let task = MockTask::<i32, &str>::new();
        task.set_result(1);
        task.set_error("also failed");

        assert!(task.is_running());
        assert_eq!(task.result(), Some(1));
        assert_eq!(task.error(), Some("also failed"));
    }
}
