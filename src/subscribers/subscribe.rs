//! # Subscriber trait for task lifecycle notifications.
//!
//! `Subscribe` is the extension point for reacting to [`TaskEvent`]s outside
//! the task itself (progress UIs, metrics, audit). Each subscriber is driven by
//! a dedicated worker fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they never block the task that raised the
//!   notification nor other subscribers.
//! - If a subscriber's queue overflows, notifications for it are **dropped** (warn).
//!
//! ## Example
//! ```rust
//! use eventvisor::{Subscribe, TaskEvent, TaskEventKind};
//!
//! struct FailureCounter(std::sync::atomic::AtomicUsize);
//!
//! #[async_trait::async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &TaskEvent) {
//!         if ev.kind == TaskEventKind::Error {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "failure-counter"
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::tracker::TaskEvent;

/// Contract for lifecycle subscribers.
///
/// Called from a subscriber-dedicated worker task. Avoid blocking the runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one notification.
    async fn on_event(&self, event: &TaskEvent);

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
