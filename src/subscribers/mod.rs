//! # Lifecycle subscribers.
//!
//! Tracked tasks publish [`TaskEvent`](crate::TaskEvent)s on the
//! [`Bus`](crate::Bus); the hub listener forwards each one to a
//! [`SubscriberSet`], which fans it out to every [`Subscribe`] implementation.
//!
//! ```text
//! TrackedTask ── publish ──► Bus ──► hub listener ──► SubscriberSet
//!                                                        ├──► LogWriter
//!                                                        └──► custom ...
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
