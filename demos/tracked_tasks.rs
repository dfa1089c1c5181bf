//! # Example: tracked_tasks
//!
//! Runs a few tracked tasks and renders their progress while they run.
//!
//! Shows how to:
//! - Spawn tasks with [`Hub::spawn`] and report progress.
//! - Poll [`Hub::snapshot_into`] from a render loop.
//! - Observe lifecycle notifications with [`LogWriter`] and a custom subscriber.
//! - Await a task's outcome, including failures and panics.
//!
//! ## Run
//! Requires the `logging` feature to export [`LogWriter`].
//! ```bash
//! cargo run --example tracked_tasks --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use eventvisor::{
    Config, Hub, LogWriter, Progress, Subscribe, TaskError, TaskEvent, TaskEventKind,
    TaskEventMask,
};
use tracing_subscriber::EnvFilter;

/// Prints one line per finished task.
struct Finished;

#[async_trait::async_trait]
impl Subscribe for Finished {
    async fn on_event(&self, ev: &TaskEvent) {
        match ev.kind {
            TaskEventKind::Success => println!("[sub] {} done", ev.task),
            TaskEventKind::Error => println!(
                "[sub] {} failed: {}",
                ev.task,
                ev.reason.as_deref().unwrap_or("<none>")
            ),
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "finished"
    }
}

async fn load_assets(p: Progress, steps: u32, step_ms: u64) -> Result<(), TaskError> {
    for i in 1..=steps {
        tokio::time::sleep(Duration::from_millis(step_ms)).await;
        p.report(i as f32 / steps as f32)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = Config {
        log_task_events: TaskEventMask::ERROR | TaskEventMask::DISPOSED,
        grace: Duration::from_secs(2),
        ..Config::default()
    };
    let hub = Hub::builder(cfg)
        .with_subscribers(vec![Arc::new(LogWriter::new()), Arc::new(Finished)])
        .build();

    let textures = hub.spawn("Textures", |p: Progress| load_assets(p, 10, 40));
    let audio = hub.spawn("Audio", |p: Progress| load_assets(p, 4, 90));
    let shaders = hub.spawn("Shaders", |p: Progress| async move {
        load_assets(p, 3, 50).await?;
        Err(TaskError::fail("shader cache corrupted"))
    });
    let fonts = hub.spawn("Fonts", |p: Progress| async move {
        p.report(0.2)?;
        if p.task_id().is_nil() {
            return Ok(());
        }
        panic!("font file truncated");
    });

    let mut frame = Vec::new();
    while hub.snapshot_into(&mut frame) > 0 {
        println!("--- {} live ---", frame.len());
        for entry in &frame {
            println!("{entry}");
        }
        if let Some(task) = hub.tracker().tasks().first() {
            println!("{}", task.progress_bar());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    for task in [&textures, &audio, &shaders, &fonts] {
        match task.wait().await {
            Ok(()) => println!("{} -> ok", task.display_no_progress()),
            Err(e) => println!("{} -> {} ({})", task.display_no_progress(), e, e.as_label()),
        }
    }

    hub.shutdown().await?;
    Ok(())
}
