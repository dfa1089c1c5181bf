//! Hub core: configuration, construction and the context object.
//!
//! - [`Config`]: settings read once at build time;
//! - [`HubBuilder`]: assembles registry, tracker and subscribers;
//! - [`Hub`]: owns them and exposes fire/spawn/snapshot/shutdown.

mod builder;
mod config;
mod hub;

pub use builder::HubBuilder;
pub use config::Config;
pub use hub::Hub;
