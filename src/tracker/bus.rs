//! # Broadcast bus for task lifecycle notifications.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Tracked tasks
//! publish from worker threads; the hub listener forwards to subscribers.
//!
//! ```text
//! Publishers (many):                  Subscriber (one):
//!   task runner 1 ──┐
//!   task runner 2 ──┼──► Bus ──► hub listener ──► SubscriberSet
//!   spawn()       ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks.
//! - One ring buffer of `capacity` notifications is shared by all receivers.
//! - Slow receivers get `RecvError::Lagged(n)` and skip the `n` oldest items.
//! - Notifications are dropped if nobody is subscribed.

use tokio::sync::broadcast;

use super::notice::TaskEvent;

/// Broadcast channel for [`TaskEvent`]s. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<TaskEvent>,
}

impl Bus {
    /// Creates a bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<TaskEvent>(capacity.max(1));
        Self { tx }
    }

    /// Publishes a notification to all active receivers.
    pub fn publish(&self, ev: TaskEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver observing notifications sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }

    /// Number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
