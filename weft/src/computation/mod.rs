//! Resumable computations.
//!
//! A [`Resumable`] is advanced by feeding it one input at a time and
//! observing a [`Step`] after each. This module provides:
//! - [`make_iterator`], which builds a resumable from plain closures,
//! - [`make_cloneable`], which records a computation's inputs so that it
//!   can later be forked into an independent copy.

mod cloneable;
mod sequence;

pub use cloneable::{Cloneable, CloneableFactory, ReplayError, make_cloneable};
pub use sequence::{LazySequence, default_raise, make_iterator};

/// One observation of a resumable computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<T> {
    /// The computation paused with this value and can be resumed.
    Yielded(T),
    /// The computation ended with this value.
    Done(T),
}

impl<T> Step<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Step::Yielded(value) | Step::Done(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Step::Yielded(value) | Step::Done(value) => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Step<U> {
        match self {
            Step::Yielded(value) => Step::Yielded(f(value)),
            Step::Done(value) => Step::Done(f(value)),
        }
    }
}

/// A computation that is advanced incrementally.
pub trait Resumable {
    type Input;
    type Output;
    type Error;

    /// Feeds `input` and runs the computation to its next step.
    fn resume(&mut self, input: Self::Input) -> Result<Step<Self::Output>, Self::Error>;

    /// Injects `error` at the point where the computation is paused.
    ///
    /// A computation that does not handle the error returns it.
    fn raise(&mut self, error: Self::Error) -> Result<Step<Self::Output>, Self::Error>;

    /// Ends the computation early with `value`.
    fn finish(&mut self, value: Self::Output) -> Step<Self::Output>;
}

/// A resumable the surrounding effect system knows how to drive.
pub trait EffectSequence: Resumable {
    /// Diagnostic name of the sequence.
    fn name(&self) -> &str;
}
