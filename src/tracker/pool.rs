//! # Task tracker.
//!
//! [`TaskTracker`] spawns tracked tasks on the tokio worker pool and owns the
//! [`LiveSet`] they register in. Clones share the same live set and bus.

use std::future::Future;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::core::Config;
use crate::error::TaskError;

use super::bus::Bus;
use super::live::{LiveSet, TaskSnapshot};
use super::notice::{TaskEvent, TaskEventKind, TaskEventMask};
use super::runner::run_tracked;
use super::task::{Progress, TaskInner, TrackedTask};

/// State shared by the tracker and every task it spawned.
pub(crate) struct TrackerShared {
    pub(crate) live: LiveSet,
    pub(crate) bus: Bus,
    pub(crate) log_mask: TaskEventMask,
    pub(crate) bar_segments: usize,
}

impl TrackerShared {
    /// Logs `ev` if its kind is enabled, then publishes it.
    pub(crate) fn raise(&self, ev: TaskEvent, task: &TaskInner) {
        if self.log_mask.contains(ev.kind) {
            match ev.kind {
                TaskEventKind::Created => trace!(seq = ev.seq, "{task} created"),
                TaskEventKind::Disposed => trace!(seq = ev.seq, "{task} disposed"),
                TaskEventKind::Success => {
                    trace!(seq = ev.seq, "{task} completed successfully")
                }
                TaskEventKind::Error => warn!(
                    seq = ev.seq,
                    reason = ev.reason.as_deref().unwrap_or("unknown"),
                    "{task} failed"
                ),
                TaskEventKind::ProgressUpdated => trace!(
                    seq = ev.seq,
                    "{task} progress update ({:>6})",
                    format!("{:04.1}%", ev.progress * 100.0)
                ),
            }
        }
        self.bus.publish(ev);
    }
}

/// Spawns and tracks named background tasks.
#[derive(Clone)]
pub struct TaskTracker {
    shared: Arc<TrackerShared>,
}

impl TaskTracker {
    /// Creates a tracker publishing lifecycle notifications on `bus`.
    pub fn new(cfg: &Config, bus: Bus) -> Self {
        Self {
            shared: Arc::new(TrackerShared {
                live: LiveSet::default(),
                bus,
                log_mask: cfg.log_task_events,
                bar_segments: cfg.progress_bar_segments_clamped(),
            }),
        }
    }

    /// Starts `body` as a tracked task named `name`.
    ///
    /// The task is in the live set and `Created` has been raised when this
    /// returns. The body runs on the tokio worker pool, so this must be called
    /// from within a tokio runtime.
    pub fn spawn<F, Fut>(&self, name: impl Into<Arc<str>>, body: F) -> TrackedTask
    where
        F: FnOnce(Progress) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let task = TrackedTask::from_inner(Arc::new(TaskInner::new(
            name.into(),
            self.shared.clone(),
        )));
        self.shared.live.insert(task.clone());
        task.raise_created();

        tokio::spawn(run_tracked(task.clone(), body));
        task
    }

    /// The live set.
    pub fn live(&self) -> &LiveSet {
        &self.shared.live
    }

    /// Copies every live task. See [`LiveSet::snapshot`].
    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.shared.live.snapshot()
    }

    /// Buffer-reusing [`TaskTracker::snapshot`].
    pub fn snapshot_into(&self, buf: &mut Vec<TaskSnapshot>) -> usize {
        self.shared.live.snapshot_into(buf)
    }

    /// Handles of every live task.
    pub fn tasks(&self) -> Vec<TrackedTask> {
        self.shared.live.tasks()
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.shared.live.len()
    }

    /// True if no task is live.
    pub fn is_empty(&self) -> bool {
        self.shared.live.is_empty()
    }

    /// Bus the lifecycle notifications are published on.
    pub fn bus(&self) -> &Bus {
        &self.shared.bus
    }
}

impl std::fmt::Debug for TaskTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTracker")
            .field("live", &self.shared.live)
            .field("log_mask", &self.shared.log_mask)
            .finish_non_exhaustive()
    }
}
