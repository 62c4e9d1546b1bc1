//! Spawned tasks.
//!
//! This module defines how the runtime stores and wakes tasks and the
//! [`JoinHandle`] returned to the spawner.

mod core;
mod handle;

pub(crate) mod waker;

pub(crate) use core::{Header, Output, TaskSlot, bind};

pub use core::{spawn, try_spawn};
pub use handle::JoinHandle;
