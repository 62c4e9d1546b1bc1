use super::{EffectSequence, Resumable, Step};

use std::fmt;

type NextFn<I, O, E> = Box<dyn FnMut(I) -> Result<Step<O>, E>>;
type RaiseFn<O, E> = Box<dyn FnMut(E) -> Result<Step<O>, E>>;

/// The default error handler: re-raises the injected error.
pub fn default_raise<O, E>(err: E) -> Result<Step<O>, E> {
    Err(err)
}

/// Builds a resumable sequence from a `next` closure.
///
/// The sequence is named `"iterator"` and re-raises injected errors
/// until configured otherwise with [`named`](LazySequence::named) and
/// [`on_raise`](LazySequence::on_raise).
///
/// # Examples
///
/// ```rust
/// use weft::computation::{Resumable, Step, make_iterator};
///
/// let mut count = 0;
/// let mut seq = make_iterator(move |step: u32| {
///     count += step;
///     Ok::<_, ()>(if count >= 3 { Step::Done(count) } else { Step::Yielded(count) })
/// });
///
/// assert_eq!(seq.resume(2), Ok(Step::Yielded(2)));
/// assert_eq!(seq.resume(2), Ok(Step::Done(4)));
/// ```
pub fn make_iterator<I, O, E>(
    next: impl FnMut(I) -> Result<Step<O>, E> + 'static,
) -> LazySequence<I, O, E>
where
    O: 'static,
    E: 'static,
{
    LazySequence {
        name: String::from("iterator"),
        next: Box::new(next),
        on_raise: Box::new(default_raise),
    }
}

/// A resumable made of closures, built by [`make_iterator`].
///
/// Holds no state of its own beyond what the closures capture.
pub struct LazySequence<I, O, E> {
    name: String,
    next: NextFn<I, O, E>,
    on_raise: RaiseFn<O, E>,
}

impl<I, O, E> LazySequence<I, O, E> {
    /// Replaces the diagnostic name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the handler for injected errors.
    pub fn on_raise(mut self, handler: impl FnMut(E) -> Result<Step<O>, E> + 'static) -> Self {
        self.on_raise = Box::new(handler);
        self
    }
}

impl<I, O, E> Resumable for LazySequence<I, O, E> {
    type Input = I;
    type Output = O;
    type Error = E;

    fn resume(&mut self, input: I) -> Result<Step<O>, E> {
        (self.next)(input)
    }

    fn raise(&mut self, error: E) -> Result<Step<O>, E> {
        (self.on_raise)(error)
    }

    /// Returns `Step::Done(value)` without consulting `next`.
    fn finish(&mut self, value: O) -> Step<O> {
        Step::Done(value)
    }
}

impl<I, O, E> EffectSequence for LazySequence<I, O, E> {
    fn name(&self) -> &str {
        &self.name
    }
}

impl<I, O, E> fmt::Debug for LazySequence<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySequence")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
