//! Handler registry and event dispatch.
//!
//! ## Contents
//! - [`HandlerDecl`], [`HandlerFn`] what modules declare
//! - [`HandlerModule`], [`ModuleSource`] where declarations come from
//! - [`HandlerWrapper`] the four normalized handler shapes
//! - [`Registry`] the kind-keyed table, indexing and dispatch
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use eventvisor::{
//!     GameLoaded, HandlerDecl, HandlerFn, HandlerGroup, ModuleList, Registry, StaticModule,
//! };
//!
//! let modules = ModuleList::new().with(
//!     StaticModule::new("core").with_group(
//!         HandlerGroup::new("Startup").with(
//!             HandlerDecl::new(
//!                 "startup::greet",
//!                 HandlerFn::with_event::<GameLoaded, _>(|ev: &GameLoaded| {
//!                     println!("welcome to {}", ev.title);
//!                     Ok(())
//!                 }),
//!             )
//!             .subscribe::<GameLoaded>(),
//!         ),
//!     ),
//! );
//!
//! let registry = Registry::new(Arc::new(modules));
//! let stats = registry.index();
//! assert_eq!(stats.registered, 1);
//! assert!(registry.fire(GameLoaded::new("demo")).is_empty());
//! ```

mod dispatch;
mod handler;
mod module;
mod stats;
mod table;
mod wrapper;

pub use handler::{
    AnyEvent, EventParam, HandlerDecl, HandlerFn, HandlerResult, ParamType, Receiver,
};
pub use module::{HandlerGroup, HandlerModule, ModuleList, ModuleSource, StaticModule};
pub use stats::IndexStats;
pub use table::Registry;
pub use wrapper::{HandlerId, HandlerWrapper, WrapperMeta};
