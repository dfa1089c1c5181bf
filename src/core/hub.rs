//! # Hub: the context object owning the registry and the task tracker.
//!
//! A host builds one [`Hub`] at startup (see [`HubBuilder`](crate::HubBuilder))
//! and passes it (or an `Arc` of it) wherever events are fired or background
//! work is started. Nothing in this crate is process-global.
//!
//! ## Architecture
//! ```text
//!                 ┌──────────────────────── Hub ────────────────────────┐
//! fire(ev) ──────►│ Registry ── kind-keyed table ──► handlers           │
//!                 │                                                     │
//! spawn(name) ───►│ TaskTracker ── LiveSet                              │
//!                 │      │                                              │
//!                 │      └─ TaskEvent ──► Bus ──► listener ──► SubscriberSet
//!                 └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shutdown
//! ```text
//! shutdown()
//!   ├─► wait up to cfg.grace for live tasks (no cancellation)
//!   │     └─ still live → RuntimeError::GraceExceeded { stuck }
//!   ├─► cancel listener token
//!   └─► listener forwards what is buffered, then drains subscriber queues
//! ```

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::Config;
use crate::error::{HandlerError, RegistrationError, RuntimeError, TaskError};
use crate::events::Event;
use crate::registry::{HandlerDecl, IndexStats, Registry};
use crate::subscribers::SubscriberSet;
use crate::tracker::{Bus, Progress, TaskSnapshot, TaskTracker, TrackedTask};

use super::builder::HubBuilder;

/// Owns the handler registry, the task tracker and the lifecycle plumbing.
pub struct Hub {
    cfg: Config,
    registry: Arc<Registry>,
    tracker: TaskTracker,
    token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Hub {
    /// Shorthand for [`HubBuilder::new`].
    pub fn builder(cfg: Config) -> HubBuilder {
        HubBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        registry: Arc<Registry>,
        tracker: TaskTracker,
        subs: SubscriberSet,
    ) -> Self {
        let token = CancellationToken::new();
        let listener = if subs.is_empty() {
            None
        } else {
            Some(spawn_listener(tracker.bus(), subs, token.clone()))
        };
        Self {
            cfg,
            registry,
            tracker,
            token,
            listener: Mutex::new(listener),
        }
    }

    /// Configuration the hub was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The handler registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The task tracker.
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// The lifecycle bus.
    pub fn bus(&self) -> &Bus {
        self.tracker.bus()
    }

    /// Re-indexes the registry. See [`Registry::index`].
    pub fn index(&self) -> IndexStats {
        self.registry.index()
    }

    /// Registers a handler at runtime. See [`Registry::subscribe`].
    pub fn subscribe(&self, decl: HandlerDecl) -> Result<usize, Vec<RegistrationError>> {
        self.registry.subscribe(decl)
    }

    /// Fires `ev`. See [`Registry::dispatch`].
    pub fn dispatch(&self, ev: &dyn Event) -> Vec<HandlerError> {
        self.registry.dispatch(ev)
    }

    /// Fires `ev` and logs the failures. See [`Registry::dispatch_logged`].
    pub fn dispatch_logged(&self, ev: &dyn Event) {
        self.registry.dispatch_logged(ev)
    }

    /// Typed shorthand for [`Hub::dispatch`].
    pub fn fire<E: Event>(&self, ev: E) -> Vec<HandlerError> {
        self.registry.fire(ev)
    }

    /// Starts a tracked task. See [`TaskTracker::spawn`].
    pub fn spawn<F, Fut>(&self, name: impl Into<Arc<str>>, body: F) -> TrackedTask
    where
        F: FnOnce(Progress) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.tracker.spawn(name, body)
    }

    /// Copies every live task.
    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.tracker.snapshot()
    }

    /// Buffer-reusing [`Hub::snapshot`].
    pub fn snapshot_into(&self, buf: &mut Vec<TaskSnapshot>) -> usize {
        self.tracker.snapshot_into(buf)
    }

    /// Waits for live tasks, then stops the lifecycle listener and drains subscribers.
    ///
    /// Calling it again is a no-op apart from the wait for live tasks.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let pending = self.tracker.tasks();
        debug!(live = pending.len(), ?grace, "hub shutting down");

        let waited = tokio::time::timeout(grace, async {
            for task in &pending {
                let _ = task.wait().await;
            }
        })
        .await;

        let result = match waited {
            Ok(()) => Ok(()),
            Err(_elapsed) => {
                let stuck: Vec<String> = self
                    .tracker
                    .tasks()
                    .iter()
                    .map(|t| t.name().to_string())
                    .collect();
                warn!(?grace, ?stuck, "tracked tasks still running after grace");
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        };

        self.token.cancel();
        let listener = self.listener.lock().take();
        if let Some(handle) = listener {
            let _ = handle.await;
        }
        result
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("registry", &self.registry)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

/// Forwards bus notifications to the subscriber set until cancelled.
fn spawn_listener(bus: &Bus, subs: SubscriberSet, token: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "lifecycle listener lagged");
                    }
                }
            }
        }

        while let Ok(ev) = rx.try_recv() {
            subs.emit(&ev);
        }
        subs.shutdown().await;
    })
}
