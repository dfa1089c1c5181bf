//! Events: the dispatch-side data model.
//!
//! ## Contents
//! - [`Event`] the contract every event kind implements
//! - [`EventKind`] the type identifier used as the dispatch key
//! - [`GameLoaded`], [`GameStarted`], [`FrameTick`] built-in host events
//!
//! Events are constructed right before dispatch and dropped once every
//! handler has run; nothing here is persisted.

mod builtin;
mod event;

pub use builtin::{FrameTick, GameLoaded, GameStarted};
pub use event::{Event, EventKind};

pub(crate) use event::downcast_chain;

#[cfg(test)]
pub(crate) use event::tests as fixtures;
