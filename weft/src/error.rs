//! Error types shared by every primitive in the crate.

use std::fmt;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the runtime and its primitives.
///
/// Nothing in the crate retries: every failure is reported to the
/// nearest caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The awaited operation was cancelled before it produced a value.
    #[error("operation was cancelled")]
    Cancelled,

    /// A runtime-bound operation was attempted without an entered runtime.
    #[error("{0} must be called within the context of a runtime")]
    OutsideRuntime(&'static str),

    /// A programmer error reported by [`check`](crate::diagnostics::check).
    #[error("{0}")]
    Assertion(String),

    /// The crate observed a state that should be unreachable.
    #[error("{0}")]
    Internal(String),
}

/// Builds an [`Error::Internal`] carrying the standard bug-report preamble.
///
/// # Examples
///
/// ```rust
/// let err = weft::error::internal_err("slot reported twice");
/// assert!(err.to_string().contains("Error: slot reported twice"));
/// ```
pub fn internal_err(err: impl fmt::Display) -> Error {
    Error::Internal(format!(
        "\n  weft: error checking hooks detected an inconsistent state. This is likely a bug\n  \
         in weft code and not yours. Thanks for reporting this in the project's github repo.\n  \
         Error: {err}\n"
    ))
}
