/// One of the two reserved values meaning "stop the whole group".
///
/// A completion signal short-circuits a fan-in like an error does, but it
/// is forwarded as a signal and never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionSignal {
    Terminate,
    Cancel,
}

/// What a child slot delivers to a fan-in combinator.
///
/// Success values, errors and completion signals are separate variants,
/// so a child can never produce a completion signal by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report<T, E> {
    Value(T),
    Error(E),
    Signal(CompletionSignal),
}

impl<T, E> Report<T, E> {
    pub fn is_error(&self) -> bool {
        matches!(self, Report::Error(_))
    }

    /// Whether this report ends the group on its own.
    pub fn is_short_circuit(&self) -> bool {
        !matches!(self, Report::Value(_))
    }
}

impl<T, E> From<Result<T, E>> for Report<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Report::Value(value),
            Err(err) => Report::Error(err),
        }
    }
}

impl<T, E> From<CompletionSignal> for Report<T, E> {
    fn from(signal: CompletionSignal) -> Self {
        Report::Signal(signal)
    }
}

pub fn should_terminate<T, E>(report: &Report<T, E>) -> bool {
    matches!(report, Report::Signal(CompletionSignal::Terminate))
}

pub fn should_cancel<T, E>(report: &Report<T, E>) -> bool {
    matches!(report, Report::Signal(CompletionSignal::Cancel))
}

/// Either completion signal.
pub fn should_complete<T, E>(report: &Report<T, E>) -> bool {
    should_terminate(report) || should_cancel(report)
}
