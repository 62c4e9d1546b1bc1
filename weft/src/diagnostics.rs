//! Diagnostics sink.
//!
//! All output goes through [`tracing`]; this module only adds the two
//! severities the primitives report at and a couple of helpers that
//! depend on the build mode.

use crate::error::{Error, Result};

use tracing::{error, warn};

/// Severity accepted by [`log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warn,
    Error,
}

/// Emits `message` at `level`, attaching `err` as a field when present.
///
/// # Examples
///
/// ```rust
/// use weft::diagnostics::{log, Level};
///
/// log(Level::Warn, "slot reported twice", None);
/// ```
pub fn log(level: Level, message: &str, err: Option<&dyn std::error::Error>) {
    match (level, err) {
        (Level::Warn, Some(err)) => warn!(error = %err, "weft: {message}"),
        (Level::Warn, None) => warn!("weft: {message}"),
        (Level::Error, Some(err)) => error!(error = %err, "weft: {message}"),
        (Level::Error, None) => error!("weft: {message}"),
    }
}

/// Wraps `f` so every call logs `warning` before delegating.
///
/// The warning is only emitted in debug builds; release builds call
/// straight through.
pub fn deprecate<A, R, F>(f: F, warning: impl Into<String>) -> impl Fn(A) -> R
where
    F: Fn(A) -> R,
{
    let warning = warning.into();

    move |args| {
        if cfg!(debug_assertions) {
            log(Level::Warn, &warning, None);
        }
        f(args)
    }
}

/// Returns `value` if it satisfies `predicate`, otherwise an
/// [`Error::Assertion`] carrying `message`.
pub fn check<T>(value: T, predicate: impl FnOnce(&T) -> bool, message: &str) -> Result<T> {
    if predicate(&value) {
        Ok(value)
    } else {
        Err(Error::Assertion(message.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_value_through() {
        assert_eq!(check(3, |n| *n > 0, "positive"), Ok(3));
    }

    #[test]
    fn check_reports_message() {
        let err = check(0, |n| *n > 0, "expected a non-empty shape").unwrap_err();
        assert_eq!(err, Error::Assertion("expected a non-empty shape".into()));
    }

    #[test]
    fn deprecated_function_still_delegates() {
        let double = deprecate(|n: u32| n * 2, "double is deprecated");
        assert_eq!(double(21), 42);
    }
}
