//! # Live set of tracked tasks.
//!
//! Every task enters the set when it is spawned and leaves it when it is
//! disposed. Readers copy what they need; the lock is held only for the copy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use super::task::{Line, TaskState, TrackedTask};

/// Point-in-time copy of one live task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    /// Task id.
    pub id: Uuid,
    /// Task name.
    pub name: Arc<str>,
    /// Progress at snapshot time.
    pub progress: f32,
    /// State at snapshot time.
    pub state: TaskState,
}

impl fmt::Display for TaskSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = Line {
            name: &self.name,
            id: self.id,
            progress: Some(self.progress),
        };
        fmt::Display::fmt(&line, f)
    }
}

/// Concurrent set of non-disposed tasks.
#[derive(Default)]
pub struct LiveSet {
    tasks: RwLock<HashMap<Uuid, TrackedTask>>,
}

impl LiveSet {
    pub(crate) fn insert(&self, task: TrackedTask) {
        self.tasks.write().insert(task.id(), task);
    }

    pub(crate) fn remove(&self, id: Uuid) -> bool {
        self.tasks.write().remove(&id).is_some()
    }

    /// Copies every live task, sorted by name then id.
    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        let mut out = Vec::new();
        self.snapshot_into(&mut out);
        out
    }

    /// Like [`LiveSet::snapshot`], reusing `buf` (cleared first).
    ///
    /// Returns the number of entries written.
    pub fn snapshot_into(&self, buf: &mut Vec<TaskSnapshot>) -> usize {
        buf.clear();
        {
            let tasks = self.tasks.read();
            buf.reserve(tasks.len());
            buf.extend(tasks.values().map(|t| TaskSnapshot {
                id: t.id(),
                name: t.inner_name(),
                progress: t.progress(),
                state: t.state(),
            }));
        }
        buf.sort_unstable_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        buf.len()
    }

    /// Handles of every live task, sorted by name then id.
    pub fn tasks(&self) -> Vec<TrackedTask> {
        let mut tasks: Vec<TrackedTask> = self.tasks.read().values().cloned().collect();
        tasks.sort_unstable_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        tasks
    }

    /// Handle of the live task with `id`.
    pub fn get(&self, id: Uuid) -> Option<TrackedTask> {
        self.tasks.read().get(&id).cloned()
    }

    /// True if a task with `id` is live.
    pub fn contains(&self, id: Uuid) -> bool {
        self.tasks.read().contains_key(&id)
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    /// True if no task is live.
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

impl fmt::Debug for LiveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSet").field("len", &self.len()).finish()
    }
}
