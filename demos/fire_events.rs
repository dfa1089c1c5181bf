//! # Example: fire_events
//!
//! Declares handlers in two modules, indexes them and fires events.
//!
//! Shows how to:
//! - Declare handlers with [`HandlerDecl`] / [`HandlerFn`] and group them in modules.
//! - Define a custom event kind that extends another one.
//! - Register a handler at runtime with [`Hub::subscribe`].
//! - Inspect handler failures returned by [`Hub::fire`].
//!
//! ## Flow
//! ```text
//! ModuleList ──► Hub::build() ──► Registry::index()
//!     └─► fire(GameLoaded)    ──► greet, announce
//!     └─► fire(LevelLoaded)   ──► level_name (takes SceneLoaded), failing handler
//!     └─► fire(FrameTick)     ──► silent (no firing level)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=trace cargo run --example fire_events
//! ```

use std::fmt;
use std::sync::Arc;

use eventvisor::{
    AnyEvent, Config, Event, EventKind, FrameTick, GameLoaded, GameStarted, HandlerDecl,
    HandlerError, HandlerFn, HandlerGroup, Hub, ModuleList, StaticModule,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// A scene finished loading.
struct SceneLoaded {
    scene: String,
}

impl fmt::Display for SceneLoaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene {:?} loaded", self.scene)
    }
}

impl Event for SceneLoaded {
    fn kind(&self) -> EventKind {
        EventKind::of::<Self>()
    }

    fn firing_level(&self) -> Option<Level> {
        Some(Level::DEBUG)
    }
}

/// A level (a kind of scene) finished loading.
struct LevelLoaded {
    scene: SceneLoaded,
    number: u32,
}

impl fmt::Display for LevelLoaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {} ({})", self.number, self.scene)
    }
}

impl Event for LevelLoaded {
    fn kind(&self) -> EventKind {
        EventKind::of::<Self>()
    }

    fn firing_level(&self) -> Option<Level> {
        Some(Level::INFO)
    }

    fn parent_event(&self) -> Option<&dyn Event> {
        Some(&self.scene)
    }

    fn parent_kind() -> Option<EventKind> {
        Some(EventKind::of::<SceneLoaded>())
    }
}

fn startup_module() -> StaticModule {
    StaticModule::new("startup").with_group(
        HandlerGroup::new("Startup")
            .with(
                HandlerDecl::new(
                    "startup::greet",
                    HandlerFn::with_event::<GameLoaded, _>(|ev: &GameLoaded| {
                        println!("[greet] welcome to {}", ev.title);
                        Ok(())
                    }),
                )
                .subscribe::<GameLoaded>(),
            )
            .with(
                HandlerDecl::new(
                    "startup::announce",
                    HandlerFn::with_event::<AnyEvent, _>(|ev: &dyn Event| {
                        println!("[announce] {} -> {ev}", ev.id());
                        Ok(())
                    }),
                )
                .subscribe::<GameLoaded>()
                .subscribe::<GameStarted>(),
            )
            // Skipped: bound to an instance.
            .with(
                HandlerDecl::new("startup::method", HandlerFn::no_args(|| Ok(())))
                    .subscribe::<GameLoaded>()
                    .on_instance(),
            ),
    )
}

fn levels_module() -> StaticModule {
    StaticModule::new("levels").with_group(
        HandlerGroup::new("Levels")
            .with(
                HandlerDecl::new(
                    "levels::scene_name",
                    HandlerFn::with_event_returning::<SceneLoaded, _, _>(|ev: &SceneLoaded| {
                        println!("[scene_name] {}", ev.scene);
                        Ok(ev.scene.len())
                    }),
                )
                .subscribe::<LevelLoaded>(),
            )
            .with(
                HandlerDecl::new(
                    "levels::validate",
                    HandlerFn::with_event::<LevelLoaded, _>(|ev: &LevelLoaded| {
                        if ev.number == 0 {
                            return Err(HandlerError::fail("level numbers start at 1"));
                        }
                        Ok(())
                    }),
                )
                .subscribe::<LevelLoaded>(),
            ),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let modules = Arc::new(
        ModuleList::new()
            .with(startup_module())
            .with(levels_module()),
    );
    let hub = Hub::builder(Config::default())
        .with_modules(modules.clone())
        .build();

    println!("indexed: {}", hub.registry().last_stats());
    for line in hub.registry().describe() {
        println!("  {line}");
    }

    hub.fire(GameLoaded::new("demo"));
    hub.fire(GameStarted::new("demo"));

    for number in [1, 0] {
        let errors = hub.fire(LevelLoaded {
            scene: SceneLoaded {
                scene: format!("level_{number}"),
            },
            number,
        });
        for err in errors {
            println!("[error] {} ({})", err, err.as_label());
        }
    }

    // Silent: FrameTick has no firing level and no handlers.
    hub.fire(FrameTick {
        frame: 1,
        delta: 1.0 / 60.0,
    });

    // Runtime subscription survives re-indexing.
    let added = hub.subscribe(
        HandlerDecl::new(
            "late::tick",
            HandlerFn::with_event::<FrameTick, _>(|ev: &FrameTick| {
                println!("[tick] {ev}");
                Ok(())
            }),
        )
        .subscribe::<FrameTick>(),
    );
    println!("runtime subscription: {added:?}");

    modules.unload("levels");
    println!("re-indexed: {}", hub.index());
    hub.fire(FrameTick {
        frame: 2,
        delta: 1.0 / 60.0,
    });

    hub.shutdown().await?;
    Ok(())
}
