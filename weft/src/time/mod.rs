//! Timers and cancellable delays.
//!
//! This module provides:
//! - the [`Timer`] capability and the [`TimerKey`] it hands out,
//! - [`delay`] / [`delay_on`] for timed awaitables that can be cancelled.
//!
//! The runtime owns the queue that implements [`Timer`]; see
//! [`Runtime::timer`](crate::Runtime::timer).

mod delay;
mod timer;

pub(crate) use timer::TimerQueue;

#[doc(inline)]
pub use delay::{Delay, DelayCanceller, delay, delay_on, delay_true};

#[doc(inline)]
pub use timer::{Timer, TimerCallback, TimerKey};
