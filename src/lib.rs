//! # eventvisor
//!
//! **Eventvisor** is in-process plumbing for games and other long-running
//! hosts. It provides two independent subsystems behind one context object:
//!
//! - an **event registry**: loaded modules declare handlers, the registry
//!   validates and indexes them by event kind, and firing an event invokes
//!   every handler for that exact kind with per-handler failure isolation;
//! - a **task tracker**: named background tasks on the tokio worker pool that
//!   report progress in `[0, 1]`, live in a pollable set while running and
//!   raise lifecycle notifications.
//!
//! ## Architecture
//! ```text
//!   ModuleSource ──► [HandlerModule] ──► [HandlerGroup] ──► [HandlerDecl]
//!                                │
//!                         Registry::index()
//!                                ▼
//!        ┌───────────────────── Hub ──────────────────────┐
//!        │  Registry                                      │
//!        │   EventKind ─► { HandlerWrapper, ... }         │◄── fire(GameLoaded)
//!        │                                                │
//!        │  TaskTracker                                   │◄── spawn("Load", body)
//!        │   LiveSet { TrackedTask, ... }                 │◄── snapshot()
//!        │      │                                         │
//!        │      └─ TaskEvent ─► Bus ─► listener ─► SubscriberSet ─► Subscribe
//!        └────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------|---------------------------------------------|
//! | **Events**        | Event contract, kinds and kind hierarchy.                 | [`Event`], [`EventKind`]                    |
//! | **Handlers**      | Declaring handlers and the modules that expose them.      | [`HandlerDecl`], [`HandlerFn`], [`HandlerModule`] |
//! | **Registry**      | Indexing, runtime subscription and dispatch.              | [`Registry`], [`IndexStats`]                |
//! | **Tasks**         | Tracked background work with progress.                    | [`TaskTracker`], [`TrackedTask`], [`Progress`] |
//! | **Subscriber API**| Hook into task lifecycle notifications.                   | [`Subscribe`], [`TaskEvent`]                |
//! | **Errors**        | Typed errors for handlers, registration and tasks.        | [`HandlerError`], [`TaskError`]             |
//! | **Configuration** | Centralized hub settings.                                 | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use eventvisor::{
//!     Config, GameLoaded, HandlerDecl, HandlerFn, HandlerGroup, Hub, ModuleList, Progress,
//!     StaticModule,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let modules = ModuleList::new().with(
//!         StaticModule::new("core").with_group(
//!             HandlerGroup::new("Startup").with(
//!                 HandlerDecl::new(
//!                     "startup::greet",
//!                     HandlerFn::with_event::<GameLoaded, _>(|ev: &GameLoaded| {
//!                         println!("{ev}");
//!                         Ok(())
//!                     }),
//!                 )
//!                 .subscribe::<GameLoaded>(),
//!             ),
//!         ),
//!     );
//!
//!     let hub = Hub::builder(Config::default())
//!         .with_modules(Arc::new(modules))
//!         .build();
//!
//!     assert!(hub.fire(GameLoaded::new("demo")).is_empty());
//!
//!     let load = hub.spawn("Load", |p: Progress| async move {
//!         p.report(0.5)?;
//!         Ok(())
//!     });
//!     load.wait().await?;
//!
//!     hub.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod registry;
mod subscribers;
mod tracker;

// ---- Public re-exports ----

pub use crate::core::{Config, Hub, HubBuilder};
pub use error::{
    HandlerError, ModuleLoadError, RegistrationError, RuntimeError, TaskError, TrackerError,
};
pub use events::{Event, EventKind, FrameTick, GameLoaded, GameStarted};
pub use registry::{
    AnyEvent, EventParam, HandlerDecl, HandlerFn, HandlerGroup, HandlerId, HandlerModule,
    HandlerResult, HandlerWrapper, IndexStats, ModuleList, ModuleSource, ParamType, Receiver,
    Registry, StaticModule, WrapperMeta,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tracker::{
    Bus, LiveSet, NoProgress, Progress, TaskEvent, TaskEventKind, TaskEventMask, TaskSnapshot,
    TaskState, TaskTracker, TrackedTask,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
