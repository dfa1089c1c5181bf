//! # LogWriter: lifecycle notification logger
//!
//! A minimal subscriber that writes every [`TaskEvent`] as one `tracing` line,
//! independently of `Config::log_task_events`. Use it for demos or debugging.
//!
//! ## Example output
//! ```text
//! INFO [created] task="Load" progress=0
//! INFO [progress] task="Load" progress=0.5
//! WARN [error] task="Load" reason="execution failed: disk full"
//! INFO [disposed] task="Load" progress=1
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::subscribers::Subscribe;
use crate::tracker::{TaskEvent, TaskEventKind};

/// Notification writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &TaskEvent) {
        let task = &*e.task;
        match e.kind {
            TaskEventKind::Created => {
                info!(seq = e.seq, task, id = %e.task_id, "[created]");
            }
            TaskEventKind::ProgressUpdated => {
                info!(seq = e.seq, task, progress = e.progress, "[progress]");
            }
            TaskEventKind::Success => {
                info!(seq = e.seq, task, "[success]");
            }
            TaskEventKind::Error => {
                warn!(
                    seq = e.seq,
                    task,
                    reason = e.reason.as_deref().unwrap_or("unknown"),
                    "[error]"
                );
            }
            TaskEventKind::Disposed => {
                info!(seq = e.seq, task, progress = e.progress, "[disposed]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
