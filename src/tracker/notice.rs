//! # Tracked task lifecycle notifications.
//!
//! Every tracked task raises a [`TaskEvent`] at each lifecycle step. The
//! tracker logs the kinds enabled in [`TaskEventMask`] and publishes every
//! notification on the lifecycle [`Bus`](super::Bus).
//!
//! ## Ordering guarantees
//! Each notification has a globally unique sequence number (`seq`) that
//! increases monotonically. For one task the order is always:
//!
//! ```text
//! Created → ProgressUpdated(0) → ProgressUpdated* → {Success | Error}
//!         → ProgressUpdated(1) → Disposed
//! ```
//!
//! ## Example
//! ```rust
//! use eventvisor::{TaskEventKind, TaskEventMask};
//!
//! let mask = TaskEventMask::ERROR | TaskEventMask::DISPOSED;
//! assert!(mask.contains(TaskEventKind::Error));
//! assert!(!mask.contains(TaskEventKind::ProgressUpdated));
//! ```

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use uuid::Uuid;

/// Global sequence counter for notification ordering.
static NOTICE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of task lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskEventKind {
    /// Task constructed and added to the live set.
    ///
    /// Sets: `task`, `task_id`, `progress` (0).
    Created,

    /// Task finished and was removed from the live set.
    ///
    /// Sets: `task`, `task_id`, `progress` (1).
    Disposed,

    /// Task body failed or panicked.
    ///
    /// Sets: `task`, `task_id`, `progress`, `reason`.
    Error,

    /// Task body completed.
    ///
    /// Sets: `task`, `task_id`, `progress`.
    Success,

    /// Progress changed.
    ///
    /// Sets: `task`, `task_id`, `progress` (clamped).
    ProgressUpdated,
}

impl TaskEventKind {
    /// The single-kind mask for this kind.
    pub fn mask(self) -> TaskEventMask {
        match self {
            TaskEventKind::Created => TaskEventMask::CREATED,
            TaskEventKind::Disposed => TaskEventMask::DISPOSED,
            TaskEventKind::Error => TaskEventMask::ERROR,
            TaskEventKind::Success => TaskEventMask::SUCCESS,
            TaskEventKind::ProgressUpdated => TaskEventMask::PROGRESS_UPDATED,
        }
    }

    /// Stable snake_case label.
    pub fn as_label(self) -> &'static str {
        match self {
            TaskEventKind::Created => "task_created",
            TaskEventKind::Disposed => "task_disposed",
            TaskEventKind::Error => "task_error",
            TaskEventKind::Success => "task_success",
            TaskEventKind::ProgressUpdated => "task_progress_updated",
        }
    }
}

/// Set of [`TaskEventKind`]s, used to pick which notifications get logged.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TaskEventMask(u8);

impl TaskEventMask {
    /// No kind.
    pub const NONE: Self = Self(0);
    /// [`TaskEventKind::Created`].
    pub const CREATED: Self = Self(1);
    /// [`TaskEventKind::Disposed`].
    pub const DISPOSED: Self = Self(1 << 1);
    /// [`TaskEventKind::Error`].
    pub const ERROR: Self = Self(1 << 2);
    /// [`TaskEventKind::Success`].
    pub const SUCCESS: Self = Self(1 << 3);
    /// [`TaskEventKind::ProgressUpdated`].
    pub const PROGRESS_UPDATED: Self = Self(1 << 4);
    /// Every kind.
    pub const ALL: Self = Self(0b1_1111);

    /// True if `kind` is in the set.
    #[inline]
    pub fn contains(self, kind: TaskEventKind) -> bool {
        self.0 & kind.mask().0 != 0
    }

    /// True if the set is empty.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TaskEventMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TaskEventMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<TaskEventKind> for TaskEventMask {
    fn from(kind: TaskEventKind) -> Self {
        kind.mask()
    }
}

impl fmt::Debug for TaskEventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KINDS: [TaskEventKind; 5] = [
            TaskEventKind::Created,
            TaskEventKind::Disposed,
            TaskEventKind::Error,
            TaskEventKind::Success,
            TaskEventKind::ProgressUpdated,
        ];
        f.debug_set()
            .entries(KINDS.iter().filter(|k| self.contains(**k)))
            .finish()
    }
}

/// One lifecycle notification of a tracked task.
#[derive(Debug, Clone)]
pub struct TaskEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Notification classification.
    pub kind: TaskEventKind,
    /// Id of the task.
    pub task_id: Uuid,
    /// Name of the task.
    pub task: Arc<str>,
    /// Progress at the time of the notification, in `[0, 1]`.
    pub progress: f32,
    /// Failure message (only for [`TaskEventKind::Error`]).
    pub reason: Option<Arc<str>>,
}

impl TaskEvent {
    /// Creates a notification with current timestamp and next sequence number.
    pub fn new(kind: TaskEventKind, task_id: Uuid, task: Arc<str>) -> Self {
        Self {
            seq: NOTICE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task_id,
            task,
            progress: 0.0,
            reason: None,
        }
    }

    /// Attaches the progress value.
    #[inline]
    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = progress;
        self
    }

    /// Attaches a failure message.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_combine() {
        let mut mask = TaskEventMask::NONE;
        assert!(mask.is_empty());
        mask |= TaskEventMask::ERROR;
        mask |= TaskEventKind::Success.into();

        assert!(mask.contains(TaskEventKind::Error));
        assert!(mask.contains(TaskEventKind::Success));
        assert!(!mask.contains(TaskEventKind::Created));
        assert_eq!(format!("{mask:?}"), "{Error, Success}");
    }

    #[test]
    fn all_contains_every_kind() {
        for kind in [
            TaskEventKind::Created,
            TaskEventKind::Disposed,
            TaskEventKind::Error,
            TaskEventKind::Success,
            TaskEventKind::ProgressUpdated,
        ] {
            assert!(TaskEventMask::ALL.contains(kind));
        }
    }

    #[test]
    fn sequence_numbers_increase() {
        let a = TaskEvent::new(TaskEventKind::Created, Uuid::nil(), "a".into());
        let b = TaskEvent::new(TaskEventKind::Created, Uuid::nil(), "b".into());
        assert!(b.seq > a.seq);
        assert!(a.reason.is_none());
    }
}
