//! # Event dispatch.
//!
//! Firing an event invokes every handler registered for its **exact** kind.
//! Handlers registered for a parent kind are not reached by child events;
//! the parent relation only matters when validating a handler's parameter.
//!
//! ## Rules
//! - The handler set is snapshotted under a read lock and the lock is released
//!   before the first invocation, so handlers may fire nested events.
//! - Handler failures and panics never stop the remaining handlers.
//! - Events with a [`firing_level`](Event::firing_level) get one log line per
//!   dispatch and a trace line per invocation; events without one are silent.

use tracing::{Level, debug, error, info, trace, warn};

use crate::error::HandlerError;
use crate::events::Event;

use super::table::Registry;

/// Logs at a level only known at runtime.
macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            error!($($arg)+)
        } else if level == Level::WARN {
            warn!($($arg)+)
        } else if level == Level::INFO {
            info!($($arg)+)
        } else if level == Level::DEBUG {
            debug!($($arg)+)
        } else {
            trace!($($arg)+)
        }
    }};
}

impl Registry {
    /// Invokes every handler registered for the kind of `ev`.
    ///
    /// Returns the errors of the handlers that failed, in invocation order.
    pub fn dispatch(&self, ev: &dyn Event) -> Vec<HandlerError> {
        let handlers = self.handlers(ev.kind());
        let level = ev.firing_level();
        if let Some(level) = level {
            log_at!(
                level,
                event = %ev.id(),
                handlers = handlers.len(),
                "firing event: {ev}"
            );
        }

        let mut errors = Vec::new();
        for handler in &handlers {
            if level.is_some() {
                trace!(event = %ev.id(), handler = %handler, "invoking handler");
            }
            if let Err(err) = handler.invoke(ev) {
                errors.push(err);
            }
        }
        errors
    }

    /// Like [`Registry::dispatch`], but logs the errors instead of returning them.
    pub fn dispatch_logged(&self, ev: &dyn Event) {
        for err in self.dispatch(ev) {
            trace!(
                event = %ev.id(),
                handler = err.handler(),
                label = err.as_label(),
                "handler error: {}",
                err.as_message()
            );
        }
    }

    /// Typed shorthand for [`Registry::dispatch`].
    pub fn fire<E: Event>(&self, ev: E) -> Vec<HandlerError> {
        self.dispatch(&ev)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::events::fixtures::{MainMenuLoaded, SceneLoaded, main_menu};
    use crate::events::{EventKind, FrameTick, GameLoaded, GameStarted};
    use crate::registry::handler::{AnyEvent, HandlerDecl, HandlerFn};

    fn counting(name: &'static str, hits: &Arc<AtomicUsize>) -> HandlerDecl {
        let hits = hits.clone();
        HandlerDecl::new(
            name,
            HandlerFn::no_args(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
    }

    #[test]
    fn handlers_run_once_per_matching_tag() {
        let reg = Registry::empty();
        let hits = Arc::new(AtomicUsize::new(0));
        let _ = reg.subscribe(
            counting("twice", &hits)
                .subscribe::<GameLoaded>()
                .subscribe::<GameLoaded>()
                .subscribe::<GameStarted>(),
        );

        assert!(reg.fire(GameLoaded::new("t")).is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        assert!(reg.fire(GameStarted::new("t")).is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unhandled_kinds_do_nothing() {
        let reg = Registry::empty();
        let errors = reg.fire(FrameTick {
            frame: 1,
            delta: 0.016,
        });
        assert!(errors.is_empty());
    }

    #[test]
    fn failures_are_collected_without_stopping_others() {
        let reg = Registry::empty();
        let hits = Arc::new(AtomicUsize::new(0));
        let _ = reg.subscribe(counting("ok", &hits).subscribe::<GameLoaded>());
        let _ = reg.subscribe(
            HandlerDecl::new(
                "fails",
                HandlerFn::no_args(|| Err(HandlerError::fail("boom"))),
            )
            .subscribe::<GameLoaded>(),
        );
        let _ = reg.subscribe(
            HandlerDecl::new("panics", HandlerFn::no_args(|| panic!("kaboom")))
                .subscribe::<GameLoaded>(),
        );

        let errors = reg.fire(GameLoaded::new("t"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let mut labels: Vec<&str> = errors.iter().map(HandlerError::as_label).collect();
        labels.sort_unstable();
        assert_eq!(labels, ["handler_failed", "handler_panicked"]);
    }

    #[test]
    fn dispatch_is_exact_kind_only() {
        let reg = Registry::empty();
        let parent_hits = Arc::new(AtomicUsize::new(0));
        let _ = reg.subscribe(counting("parent", &parent_hits).subscribe::<SceneLoaded>());

        assert!(reg.fire(main_menu()).is_empty());
        assert_eq!(parent_hits.load(Ordering::SeqCst), 0);

        reg.fire(SceneLoaded { scene: "x" });
        assert_eq!(parent_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn child_events_reach_parent_typed_parameters() {
        let reg = Registry::empty();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _ = reg.subscribe(
            HandlerDecl::new(
                "scene_name",
                HandlerFn::with_event::<SceneLoaded, _>(move |ev: &SceneLoaded| {
                    sink.lock().push(ev.scene);
                    Ok(())
                }),
            )
            .subscribe::<MainMenuLoaded>(),
        );

        assert!(reg.fire(main_menu()).is_empty());
        assert_eq!(*seen.lock(), ["main_menu"]);
    }

    #[test]
    fn base_parameter_receives_the_dispatched_event() {
        let reg = Registry::empty();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _ = reg.subscribe(
            HandlerDecl::new(
                "log_all",
                HandlerFn::with_event_returning::<AnyEvent, _, _>(move |ev: &dyn Event| {
                    sink.lock().push(ev.kind());
                    Ok(true)
                }),
            )
            .subscribe::<GameLoaded>()
            .subscribe::<GameStarted>(),
        );

        reg.dispatch_logged(&GameLoaded::new("t"));
        reg.dispatch_logged(&GameStarted::new("t"));
        assert_eq!(
            *seen.lock(),
            [EventKind::of::<GameLoaded>(), EventKind::of::<GameStarted>()]
        );
    }

    #[test]
    fn handlers_may_fire_nested_events() {
        let reg = Arc::new(Registry::empty());
        let hits = Arc::new(AtomicUsize::new(0));
        let _ = reg.subscribe(counting("started", &hits).subscribe::<GameStarted>());

        let inner = Arc::downgrade(&reg);
        let _ = reg.subscribe(
            HandlerDecl::new(
                "chain",
                HandlerFn::no_args(move || {
                    if let Some(reg) = inner.upgrade() {
                        reg.fire(GameStarted::new("nested"));
                    }
                    Ok(())
                }),
            )
            .subscribe::<GameLoaded>(),
        );

        assert!(reg.fire(GameLoaded::new("t")).is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    mod logging {
        use std::fmt;
        use std::sync::Arc;

        use parking_lot::Mutex;
        use tracing::field::{Field, Visit};
        use tracing::{Level, Subscriber};
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        use crate::events::{FrameTick, GameLoaded};
        use crate::registry::handler::{HandlerDecl, HandlerFn};
        use crate::registry::table::Registry;

        #[derive(Debug, Clone, Default)]
        struct Seen {
            level: Option<Level>,
            handlers: Option<u64>,
            message: String,
        }

        impl Visit for Seen {
            fn record_u64(&mut self, field: &Field, value: u64) {
                if field.name() == "handlers" {
                    self.handlers = Some(value);
                }
            }

            fn record_i64(&mut self, field: &Field, value: i64) {
                if field.name() == "handlers" {
                    self.handlers = u64::try_from(value).ok();
                }
            }

            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                if field.name() == "message" {
                    self.message = format!("{value:?}");
                }
            }
        }

        #[derive(Clone, Default)]
        struct Capture(Arc<Mutex<Vec<Seen>>>);

        impl<S: Subscriber> Layer<S> for Capture {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                let mut seen = Seen {
                    level: Some(*event.metadata().level()),
                    ..Seen::default()
                };
                event.record(&mut seen);
                self.0.lock().push(seen);
            }
        }

        fn registry() -> Registry {
            let reg = Registry::empty();
            for name in ["a", "b"] {
                let _ = reg.subscribe(
                    HandlerDecl::new(name, HandlerFn::no_args(|| Ok(())))
                        .subscribe::<GameLoaded>()
                        .subscribe::<FrameTick>(),
                );
            }
            reg
        }

        #[test]
        fn leveled_events_log_once_with_handler_count() {
            let reg = registry();
            let capture = Capture::default();
            let subscriber = tracing_subscriber::registry().with(capture.clone());

            tracing::subscriber::with_default(subscriber, || {
                assert!(reg.fire(GameLoaded::new("demo")).is_empty());
            });

            let seen = capture.0.lock().clone();
            let info: Vec<&Seen> = seen.iter().filter(|s| s.level == Some(Level::INFO)).collect();
            assert_eq!(info.len(), 1);
            assert_eq!(info[0].handlers, Some(2));
            assert!(info[0].message.starts_with("firing event"));
            assert_eq!(
                seen.iter().filter(|s| s.level == Some(Level::TRACE)).count(),
                2
            );
        }

        #[test]
        fn unleveled_events_are_silent() {
            let reg = registry();
            let capture = Capture::default();
            let subscriber = tracing_subscriber::registry().with(capture.clone());

            tracing::subscriber::with_default(subscriber, || {
                let errors = reg.fire(FrameTick {
                    frame: 1,
                    delta: 0.016,
                });
                assert!(errors.is_empty());
            });

            assert!(capture.0.lock().is_empty());
        }
    }
}
