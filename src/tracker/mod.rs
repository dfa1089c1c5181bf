//! Tracked background tasks.
//!
//! ## Contents
//! - [`TaskTracker`] spawns tasks and owns the [`LiveSet`]
//! - [`TrackedTask`] handle: progress, state, outcome, formatting
//! - [`Progress`] reporter handed to task bodies
//! - [`TaskEvent`] lifecycle notifications, published on the [`Bus`]
//!
//! ## Example
//! ```rust
//! use eventvisor::{Bus, Config, Progress, TaskTracker};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let tracker = TaskTracker::new(&Config::default(), Bus::new(16));
//!     let task = tracker.spawn("Load", |p: Progress| async move {
//!         p.report(0.5)?;
//!         Ok(())
//!     });
//!     assert!(task.wait().await.is_ok());
//!     assert!(tracker.snapshot().is_empty());
//! }
//! ```

mod bus;
mod live;
mod notice;
mod pool;
mod runner;
mod task;

pub use bus::Bus;
pub use live::{LiveSet, TaskSnapshot};
pub use notice::{TaskEvent, TaskEventKind, TaskEventMask};
pub use pool::TaskTracker;
pub use task::{NoProgress, Progress, TaskState, TrackedTask};
