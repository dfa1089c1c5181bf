//! # Tracked task handles.
//!
//! A [`TrackedTask`] is a cheap, cloneable handle to one named unit of
//! background work. The body reports progress through its [`Progress`]
//! reporter; callers poll [`TrackedTask::progress`] or await
//! [`TrackedTask::wait`] for the captured outcome.
//!
//! ## States
//! ```text
//! Created ──► Running ──┬──► Succeeded ──┐
//!                       └──► Failed    ──┴──► Disposed
//! ```
//!
//! ## Rules
//! - Progress is always in `[0, 1]`; NaN is stored as 0.
//! - Once the body finished, [`Progress::report`] returns [`TrackerError::Disposed`].
//! - The outcome is published only after the task left the live set, so a
//!   caller that awaited it never sees the task in a later snapshot.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{TaskError, TrackerError};

use super::notice::{TaskEvent, TaskEventKind};
use super::pool::TrackerShared;

/// Lifecycle state of a tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Constructed, body not started yet.
    Created,
    /// Body is running.
    Running,
    /// Body completed.
    Succeeded,
    /// Body failed or panicked.
    Failed,
    /// Completed and removed from the live set.
    Disposed,
}

impl TaskState {
    /// True for `Succeeded`, `Failed` and `Disposed`.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Disposed
        )
    }
}

type Outcome = Option<Result<(), TaskError>>;

struct Slot {
    state: TaskState,
    progress: f32,
}

pub(crate) struct TaskInner {
    id: Uuid,
    name: Arc<str>,
    slot: Mutex<Slot>,
    done: watch::Sender<Outcome>,
    shared: Arc<TrackerShared>,
}

impl TaskInner {
    pub(crate) fn new(name: Arc<str>, shared: Arc<TrackerShared>) -> Self {
        let (done, _rx) = watch::channel(None);
        Self {
            id: Uuid::new_v4(),
            name,
            slot: Mutex::new(Slot {
                state: TaskState::Created,
                progress: 0.0,
            }),
            done,
            shared,
        }
    }

    fn notice(&self, kind: TaskEventKind) -> TaskEvent {
        TaskEvent::new(kind, self.id, self.name.clone()).with_progress(self.slot.lock().progress)
    }

    fn set_state(&self, state: TaskState) {
        self.slot.lock().state = state;
    }

    /// Stores `value` (clamped) and raises `ProgressUpdated`.
    ///
    /// Rejected once the body has finished, so the forced final progress
    /// cannot be overwritten by a leaked reporter.
    fn set_progress(&self, value: f32) -> Result<(), TrackerError> {
        let value = clamp_progress(value);
        {
            let mut slot = self.slot.lock();
            if slot.state.is_finished() {
                return Err(TrackerError::Disposed {
                    name: self.name.to_string(),
                    id: self.id,
                });
            }
            slot.progress = value;
        }
        self.shared
            .raise(self.notice(TaskEventKind::ProgressUpdated), self);
        Ok(())
    }

    /// Internal write of the final progress, bypassing the finished check.
    fn force_progress(&self, value: f32) {
        self.slot.lock().progress = clamp_progress(value);
        self.shared
            .raise(self.notice(TaskEventKind::ProgressUpdated), self);
    }
}

/// Clamps to `[0, 1]`, mapping NaN to 0.
fn clamp_progress(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Handle to a tracked task.
#[derive(Clone)]
pub struct TrackedTask {
    pub(crate) inner: Arc<TaskInner>,
}

impl TrackedTask {
    pub(crate) fn from_inner(inner: Arc<TaskInner>) -> Self {
        Self { inner }
    }

    /// Unique id.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Name given at spawn.
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn inner_name(&self) -> Arc<str> {
        self.inner.name.clone()
    }

    /// Current state.
    pub fn state(&self) -> TaskState {
        self.inner.slot.lock().state
    }

    /// Current progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.inner.slot.lock().progress
    }

    /// True once the task left the live set.
    pub fn is_disposed(&self) -> bool {
        self.state() == TaskState::Disposed
    }

    /// The captured outcome, if the task has completed.
    pub fn outcome(&self) -> Option<Result<(), TaskError>> {
        self.inner.done.borrow().clone()
    }

    /// Waits for completion and returns the captured outcome.
    ///
    /// Failures of the body are only observable here.
    pub async fn wait(&self) -> Result<(), TaskError> {
        let mut rx = self.inner.done.subscribe();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| Err(TaskError::fail("task outcome lost")))
    }

    /// `TrackedTask <name> Id <id>`, without progress.
    pub fn display_no_progress(&self) -> NoProgress<'_> {
        NoProgress(self)
    }

    /// [`Display`](fmt::Display) text followed by a `[====------]` bar.
    ///
    /// The bar width is `Config::progress_bar_segments`.
    pub fn progress_bar(&self) -> String {
        let progress = self.progress();
        format!(
            "{} [{}]",
            Line {
                name: &self.inner.name,
                id: self.inner.id,
                progress: Some(progress),
            },
            bar(progress, self.inner.shared.bar_segments)
        )
    }

    /// Sets `Running` and reports the initial zero progress.
    pub(crate) fn start(&self) -> Progress {
        self.inner.set_state(TaskState::Running);
        let reporter = Progress {
            inner: self.inner.clone(),
        };
        let _ = self.inner.set_progress(0.0);
        reporter
    }

    /// Records the outcome, forces progress to 1, disposes, then publishes the outcome.
    pub(crate) fn finish(&self, outcome: Result<(), TaskError>) {
        let inner = &self.inner;
        match &outcome {
            Ok(()) => {
                inner.set_state(TaskState::Succeeded);
                inner.shared.raise(inner.notice(TaskEventKind::Success), inner);
            }
            Err(err) => {
                inner.set_state(TaskState::Failed);
                inner.shared.raise(
                    inner
                        .notice(TaskEventKind::Error)
                        .with_reason(err.to_string()),
                    inner,
                );
            }
        }
        inner.force_progress(1.0);
        self.dispose();
        inner.done.send_replace(Some(outcome));
    }

    fn dispose(&self) {
        let inner = &self.inner;
        {
            let mut slot = inner.slot.lock();
            if slot.state == TaskState::Disposed {
                return;
            }
            slot.state = TaskState::Disposed;
        }
        inner.shared.live.remove(inner.id);
        inner.shared.raise(inner.notice(TaskEventKind::Disposed), inner);
    }

    pub(crate) fn raise_created(&self) {
        let inner = &self.inner;
        inner.shared.raise(inner.notice(TaskEventKind::Created), inner);
    }
}

impl fmt::Display for TrackedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = Line {
            name: &self.inner.name,
            id: self.inner.id,
            progress: Some(self.progress()),
        };
        fmt::Display::fmt(&line, f)
    }
}

impl fmt::Debug for TrackedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.inner.slot.lock();
        f.debug_struct("TrackedTask")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("state", &slot.state)
            .field("progress", &slot.progress)
            .finish()
    }
}

impl fmt::Display for TaskInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = Line {
            name: &self.name,
            id: self.id,
            progress: None,
        };
        fmt::Display::fmt(&line, f)
    }
}

/// [`TrackedTask`] formatted without progress.
pub struct NoProgress<'a>(&'a TrackedTask);

impl fmt::Display for NoProgress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0.inner, f)
    }
}

/// Reporter handed to the task body.
#[derive(Clone)]
pub struct Progress {
    inner: Arc<TaskInner>,
}

impl Progress {
    /// Reports progress; values outside `[0, 1]` are clamped, NaN counts as 0.
    ///
    /// Fails once the body has finished.
    pub fn report(&self, value: f32) -> Result<(), TrackerError> {
        self.inner.set_progress(value)
    }

    /// Id of the task this reporter belongs to.
    pub fn task_id(&self) -> Uuid {
        self.inner.id
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("task", &self.inner.name)
            .finish_non_exhaustive()
    }
}

/// One formatted task line.
pub(crate) struct Line<'a> {
    pub(crate) name: &'a str,
    pub(crate) id: Uuid,
    pub(crate) progress: Option<f32>,
}

impl fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackedTask {:<20} Id {}", self.name, self.id)?;
        if let Some(progress) = self.progress {
            let pct = format!("{:04.1}%", progress * 100.0);
            write!(f, " ({pct:>6})")?;
        }
        Ok(())
    }
}

/// `segments` characters: `=` for every full segment, `-` for the rest.
pub(crate) fn bar(progress: f32, segments: usize) -> String {
    let filled = (clamp_progress(progress) * segments as f32).floor() as usize;
    (0..segments)
        .map(|i| if i < filled { '=' } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Bus, LiveSet, TaskEventMask};

    fn task() -> TrackedTask {
        let shared = Arc::new(TrackerShared {
            live: LiveSet::default(),
            bus: Bus::new(16),
            log_mask: TaskEventMask::NONE,
            bar_segments: 25,
        });
        TrackedTask::from_inner(Arc::new(TaskInner::new("Race".into(), shared)))
    }

    #[test]
    fn reports_between_finish_and_dispose_are_rejected() {
        let task = task();
        let progress = task.start();
        assert!(progress.report(0.4).is_ok());

        task.inner.set_state(TaskState::Succeeded);
        assert!(task.state().is_finished());
        assert!(matches!(
            progress.report(0.3),
            Err(TrackerError::Disposed { .. })
        ));
        assert_eq!(task.progress(), 0.4);

        task.inner.force_progress(1.0);
        assert!(matches!(
            progress.report(0.3),
            Err(TrackerError::Disposed { .. })
        ));
        assert_eq!(task.progress(), 1.0);
    }

    #[test]
    fn finish_forces_full_progress_and_disposes() {
        let task = task();
        let progress = task.start();
        progress.report(0.2).ok();
        task.finish(Err(TaskError::fail("boom")));

        assert_eq!(task.state(), TaskState::Disposed);
        assert_eq!(task.progress(), 1.0);
        assert_eq!(task.outcome(), Some(Err(TaskError::fail("boom"))));
        assert!(progress.report(0.5).is_err());
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(clamp_progress(-0.5), 0.0);
        assert_eq!(clamp_progress(1.5), 1.0);
        assert_eq!(clamp_progress(0.25), 0.25);
        assert_eq!(clamp_progress(f32::NAN), 0.0);
        assert_eq!(clamp_progress(f32::INFINITY), 1.0);
    }

    #[test]
    fn bar_fills_whole_segments_only() {
        assert_eq!(bar(0.0, 5), "-----");
        assert_eq!(bar(0.5, 4), "==--");
        assert_eq!(bar(0.59, 5), "==---");
        assert_eq!(bar(1.0, 5), "=====");
        assert_eq!(bar(0.5, 25).len(), 25);
    }

    #[test]
    fn line_pads_name_and_progress() {
        let line = Line {
            name: "Load",
            id: Uuid::nil(),
            progress: Some(0.5),
        };
        assert_eq!(
            line.to_string(),
            format!("TrackedTask {:<20} Id {} ( 50.0%)", "Load", Uuid::nil())
        );

        let done = Line {
            progress: Some(1.0),
            ..line
        };
        assert!(done.to_string().ends_with("(100.0%)"));

        let quiet = Line {
            progress: None,
            ..done
        };
        assert!(quiet.to_string().ends_with(&Uuid::nil().to_string()));
    }

    #[test]
    fn small_progress_keeps_two_digits() {
        let line = Line {
            name: "x",
            id: Uuid::nil(),
            progress: Some(0.05),
        };
        assert!(line.to_string().ends_with("( 05.0%)"));
    }
}
