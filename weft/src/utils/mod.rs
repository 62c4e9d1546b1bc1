//! Internal data structures.
//!
//! [`Slab`] gives the runtime indexed task storage that reuses freed
//! slots, so a task's key stays valid for its whole life.

mod slab;

pub(crate) use slab::Slab;
