//! # Run the body of one tracked task.
//!
//! ## Flow
//! ```text
//! start()   → Running, ProgressUpdated(0)
//! body(progress)
//!   ├─ Ok(())        → Succeeded, Success
//!   ├─ Err(e)        → Failed, Error(e)
//!   └─ panic         → Failed, Error(panic info)
//! finish()  → ProgressUpdated(1) → leave live set → Disposed → outcome published
//! ```
//!
//! ## Rules
//! - Exactly one of `Success` / `Error` is raised per task.
//! - A panicking body never takes the worker down; the panic becomes the outcome.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::{TaskError, panic_info};

use super::task::{Progress, TrackedTask};

/// Drives `body` to completion and records its outcome on `task`.
pub(crate) async fn run_tracked<F, Fut>(task: TrackedTask, body: F)
where
    F: FnOnce(Progress) -> Fut,
    Fut: Future<Output = Result<(), TaskError>>,
{
    let progress = task.start();
    let res = AssertUnwindSafe(async move { body(progress).await })
        .catch_unwind()
        .await;

    let outcome = match res {
        Ok(outcome) => outcome,
        Err(payload) => Err(TaskError::Panicked {
            info: panic_info(payload.as_ref()),
        }),
    };
    task.finish(outcome);
}
