//! Fan-in combinators.
//!
//! A fan-in turns N child slots into one parent result. It completes once
//! every slot reported a value, assembling the values in slot order, and
//! short-circuits on the first error or [`CompletionSignal`], cancelling
//! the remaining slots.
//!
//! - [`build_combinator`] / [`Combinator`] is the synchronous core: one
//!   callback per slot, reacting to deliveries from whatever drives the
//!   children.
//! - [`all`] / [`all_keyed`] drive futures as runtime tasks through it and
//!   return a cancellable [`All`].

mod all;
mod fan_in;
mod signal;

pub use all::{All, all, all_keyed};
pub use fan_in::{
    Aggregate, CancelHandle, Combinator, Interrupted, Outcome, Shape, SlotCallback, Slots,
    build_combinator,
};
pub use signal::{CompletionSignal, Report, should_cancel, should_complete, should_terminate};
