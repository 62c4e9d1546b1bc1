use super::{EffectSequence, Resumable, Step};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

/// Replaying the recorded history into a fresh computation failed.
///
/// Forking assumes the computation is a pure function of its inputs; a
/// computation that depends on outside state may fail here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("replay failed at step {step}: {cause}")]
pub struct ReplayError<E> {
    /// Index of the history entry whose replay failed.
    pub step: usize,
    /// The error returned by the computation.
    pub cause: E,
}

/// Wraps a computation constructor so the computations it builds can be forked.
///
/// `build` is the construction recipe: called once per
/// [`start`](CloneableFactory::start) and once per fork, always with the
/// same arguments.
///
/// # Examples
///
/// ```rust
/// use weft::computation::{Step, make_cloneable, make_iterator};
///
/// let factory = make_cloneable(|start: &i32| {
///     let mut total = *start;
///     make_iterator(move |n: i32| {
///         total += n;
///         Ok::<_, ()>(Step::Yielded(total))
///     })
/// });
///
/// let mut original = factory.start(100);
/// original.advance(1).unwrap();
///
/// let mut fork = original.fork().unwrap();
/// assert_eq!(fork.advance(10), Ok(Step::Yielded(111)));
/// assert_eq!(original.advance(2), Ok(Step::Yielded(103)));
/// ```
pub fn make_cloneable<F>(build: F) -> CloneableFactory<F> {
    CloneableFactory {
        build: Arc::new(build),
    }
}

/// Starts forkable computations from a shared construction recipe.
pub struct CloneableFactory<F> {
    build: Arc<F>,
}

impl<F> CloneableFactory<F> {
    /// Builds a computation from `args` and starts recording its inputs.
    pub fn start<A, C>(&self, args: A) -> Cloneable<A, C, F>
    where
        F: Fn(&A) -> C,
        C: Resumable,
    {
        let inner = (self.build)(&args);

        Cloneable {
            build: self.build.clone(),
            args,
            history: Vec::new(),
            inner,
        }
    }
}

impl<F> Clone for CloneableFactory<F> {
    fn clone(&self) -> Self {
        Self {
            build: self.build.clone(),
        }
    }
}

/// A computation together with its construction recipe and input log.
pub struct Cloneable<A, C: Resumable, F> {
    build: Arc<F>,
    args: A,
    history: Vec<C::Input>,
    inner: C,
}

impl<A, C, F> Cloneable<A, C, F>
where
    C: Resumable,
    C::Input: Clone,
    F: Fn(&A) -> C,
{
    /// Records `input` and forwards it to the computation.
    ///
    /// The input is recorded even if the computation rejects it, so a
    /// fork replays exactly what the original saw.
    pub fn advance(&mut self, input: C::Input) -> Result<Step<C::Output>, C::Error> {
        self.history.push(input.clone());
        self.inner.resume(input)
    }

    /// Builds a fresh computation from the same arguments and replays the
    /// recorded history into it.
    ///
    /// The fork owns its own computation and history; advancing either
    /// side afterwards does not affect the other.
    pub fn fork(&self) -> Result<Self, ReplayError<C::Error>>
    where
        A: Clone,
    {
        debug!(steps = self.history.len(), "forking computation");

        let mut inner = (self.build)(&self.args);

        for (step, input) in self.history.iter().cloned().enumerate() {
            inner
                .resume(input)
                .map_err(|cause| ReplayError { step, cause })?;
        }

        Ok(Self {
            build: self.build.clone(),
            args: self.args.clone(),
            history: self.history.clone(),
            inner,
        })
    }

    /// Ends the computation with `value`. Not recorded.
    pub fn terminate(&mut self, value: C::Output) -> Step<C::Output> {
        self.inner.finish(value)
    }

    /// Injects `error` into the computation. Not recorded.
    pub fn raise(&mut self, error: C::Error) -> Result<Step<C::Output>, C::Error> {
        self.inner.raise(error)
    }
}

impl<A, C: Resumable, F> Cloneable<A, C, F> {
    /// Inputs fed through [`advance`](Self::advance), in call order.
    pub fn history(&self) -> &[C::Input] {
        &self.history
    }

    /// Arguments the computation was constructed with.
    pub fn args(&self) -> &A {
        &self.args
    }
}

impl<A, C, F> Resumable for Cloneable<A, C, F>
where
    C: Resumable,
    C::Input: Clone,
    F: Fn(&A) -> C,
{
    type Input = C::Input;
    type Output = C::Output;
    type Error = C::Error;

    fn resume(&mut self, input: Self::Input) -> Result<Step<Self::Output>, Self::Error> {
        self.advance(input)
    }

    fn raise(&mut self, error: Self::Error) -> Result<Step<Self::Output>, Self::Error> {
        Cloneable::raise(self, error)
    }

    fn finish(&mut self, value: Self::Output) -> Step<Self::Output> {
        self.terminate(value)
    }
}

impl<A, C, F> EffectSequence for Cloneable<A, C, F>
where
    C: EffectSequence,
    C::Input: Clone,
    F: Fn(&A) -> C,
{
    fn name(&self) -> &str {
        self.inner.name()
    }
}

impl<A: fmt::Debug, C: Resumable, F> fmt::Debug for Cloneable<A, C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cloneable")
            .field("args", &self.args)
            .field("steps", &self.history.len())
            .finish_non_exhaustive()
    }
}
