//! # Weft
//!
//! **Weft** provides the small set of cooperative-task primitives an
//! effect-orchestration runtime is built from. It does not interpret
//! effects itself; it supplies the pieces that ordering, cancellation and
//! aggregation are expressed with:
//!
//! - [`deferred`]: one-shot settlement cells ([`Deferred`], [`Awaitable`])
//! - [`time`]: a [`Timer`](time::Timer) capability and cancellable [`delay`](time::delay)s
//! - [`task`]: the [`Task`](task::Task) capability, runtime tasks and [`MockTask`](task::MockTask)
//! - [`combinator`]: fan-in over N child slots with short-circuit and cancellation
//! - [`computation`]: resumable computations that can be recorded and forked
//!
//! Everything runs on a single-threaded cooperative [`Runtime`]: no
//! primitive creates OS threads, and fan-in reactions run to completion
//! without yielding.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use weft::combinator::{Report, all};
//! use weft::time::delay;
//!
//! async fn child(ms: u64, value: i32) -> Report<i32, String> {
//!     match delay(Duration::from_millis(ms), value).await {
//!         Ok(value) => Report::Value(value),
//!         Err(err) => Report::Error(err.to_string()),
//!     }
//! }
//!
//! let runtime = weft::RuntimeBuilder::new().build();
//! let values = runtime.block_on(async { all([child(5, 2), child(0, 1)]).await });
//!
//! // Values come back in slot order, not arrival order.
//! assert_eq!(values, Ok(vec![2, 1]));
//! ```

mod cancel;
mod runtime;
mod utils;

pub mod combinator;
pub mod computation;
pub mod deferred;
pub mod diagnostics;
pub mod error;
pub mod id;
pub mod task;
pub mod time;

pub use cancel::{CancelHook, Cancellable};
pub use deferred::{Awaitable, Deferred, Settler};
pub use error::{Error, Result};
pub use runtime::builder::RuntimeBuilder;
pub use runtime::{Runtime, TimerHandle};

pub use weft_macros::test;
