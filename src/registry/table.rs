//! # Handler registry.
//!
//! [`Registry`] owns the kind-keyed handler table. [`Registry::index`] rebuilds
//! it from the module source; [`Registry::subscribe`] adds declarations at
//! runtime. Dispatch lives in [`dispatch`](super::dispatch).
//!
//! ## Indexing flow
//! ```text
//! index()
//!   ├─► lock index_lock (a concurrent index waits here)
//!   ├─► for module in source.modules()
//!   │     ├─► groups() ── Err(partial) ──► warn, keep recovered groups
//!   │     ├─► groups() ── panic ──► warn, count as partial, skip module
//!   │     └─► for decl: stage(decl) ──► wrappers + rule violations (warn)
//!   ├─► stage runtime subscriptions the same way
//!   ├─► table.write(): clear every set in place, refill from staged wrappers
//!   └─► store + return IndexStats
//! ```
//!
//! ## Rules
//! - Indexing never fails; violations are logged, counted and skipped.
//! - One wrapper per valid tag: a declaration tagged twice for one kind runs twice.
//! - Readers see either the old table or the new one, never a half-built one.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{RegistrationError, panic_info};
use crate::events::EventKind;

use super::handler::HandlerDecl;
use super::module::{HandlerModule, ModuleSource};
use super::stats::IndexStats;
use super::wrapper::{HandlerId, HandlerWrapper};

type HandlerSet = HashMap<HandlerId, Arc<HandlerWrapper>>;

/// Wrappers and violations produced by validating one declaration.
struct Staged {
    wrappers: Vec<Arc<HandlerWrapper>>,
    errors: Vec<RegistrationError>,
}

/// Kind-keyed table of registered handlers.
pub struct Registry {
    table: RwLock<HashMap<EventKind, HandlerSet>>,
    source: Arc<dyn ModuleSource>,
    runtime: Mutex<Vec<HandlerDecl>>,
    index_lock: Mutex<()>,
    stats: Mutex<IndexStats>,
}

impl Registry {
    /// Creates an empty registry reading modules from `source`.
    ///
    /// The table stays empty until the first [`Registry::index`].
    pub fn new(source: Arc<dyn ModuleSource>) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            source,
            runtime: Mutex::new(Vec::new()),
            index_lock: Mutex::new(()),
            stats: Mutex::new(IndexStats::default()),
        }
    }

    /// Creates a registry without modules; handlers come only from [`Registry::subscribe`].
    pub fn empty() -> Self {
        Self::new(Arc::new(Vec::<Arc<dyn HandlerModule>>::new()))
    }

    /// Rebuilds the table from the module source and runtime subscriptions.
    pub fn index(&self) -> IndexStats {
        let _guard = self.index_lock.lock();
        let started = Instant::now();
        debug!("indexing event handlers");

        let mut stats = IndexStats::default();
        let mut staged: Vec<Arc<HandlerWrapper>> = Vec::new();

        let modules = match catch_unwind(AssertUnwindSafe(|| self.source.modules())) {
            Ok(modules) => modules,
            Err(payload) => {
                warn!(
                    panic = %panic_info(payload.as_ref()),
                    "module source panicked; indexing runtime subscriptions only"
                );
                Vec::new()
            }
        };

        for module in modules {
            stats.modules_scanned += 1;
            let groups = match catch_unwind(AssertUnwindSafe(|| module.groups())) {
                Ok(Ok(groups)) => groups,
                Ok(Err(err)) => {
                    stats.partial_modules += 1;
                    warn!(
                        module = %err.module,
                        recovered = err.recovered.len(),
                        label = err.as_label(),
                        "module loaded partially: {}",
                        err.reason
                    );
                    err.recovered
                }
                Err(payload) => {
                    stats.partial_modules += 1;
                    warn!(
                        module = module.name(),
                        panic = %panic_info(payload.as_ref()),
                        "module panicked while listing handlers; skipped"
                    );
                    Vec::new()
                }
            };
            for group in &groups {
                stats.groups_scanned += 1;
                for decl in group.handlers() {
                    scan(decl, &mut stats, &mut staged);
                }
            }
        }

        let runtime = self.runtime.lock().clone();
        for decl in &runtime {
            scan(decl, &mut stats, &mut staged);
        }

        {
            let mut table = self.table.write();
            for set in table.values_mut() {
                set.clear();
            }
            for wrapper in staged {
                table
                    .entry(wrapper.meta().kind)
                    .or_default()
                    .insert(wrapper.id(), wrapper);
            }
        }
        *self.stats.lock() = stats;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            %stats,
            "event handlers indexed"
        );
        stats
    }

    /// Registers `decl` without going through a module.
    ///
    /// The declaration is validated with the same rules as indexing and kept,
    /// so later [`Registry::index`] calls register it again. Returns the number
    /// of wrappers added, or every violation if no tag could be registered.
    /// Violations of individual tags are logged when other tags succeed.
    pub fn subscribe(&self, decl: HandlerDecl) -> Result<usize, Vec<RegistrationError>> {
        let _guard = self.index_lock.lock();
        let Staged { wrappers, errors } = stage(&decl);
        for err in &errors {
            warn!(label = err.as_label(), "{err}");
        }
        if wrappers.is_empty() {
            return Err(errors);
        }

        let added = wrappers.len();
        {
            let mut table = self.table.write();
            for wrapper in wrappers {
                table
                    .entry(wrapper.meta().kind)
                    .or_default()
                    .insert(wrapper.id(), wrapper);
            }
        }
        self.runtime.lock().push(decl);
        Ok(added)
    }

    /// Number of handlers registered for exactly `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.table.read().get(&kind).map_or(0, HashMap::len)
    }

    /// Kinds with at least one registered handler, sorted by name.
    pub fn kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = self
            .table
            .read()
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(kind, _)| *kind)
            .collect();
        kinds.sort_unstable_by_key(|k| k.name());
        kinds
    }

    /// Snapshot of the handlers registered for exactly `kind`.
    pub fn handlers(&self, kind: EventKind) -> Vec<Arc<HandlerWrapper>> {
        self.table
            .read()
            .get(&kind)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default()
    }

    /// One sorted `"<kind>: <wrapper>"` line per registered wrapper.
    pub fn describe(&self) -> Vec<String> {
        let table = self.table.read();
        let mut lines: Vec<String> = table
            .iter()
            .flat_map(|(kind, set)| set.values().map(move |w| format!("{kind}: {w}")))
            .collect();
        lines.sort_unstable();
        lines
    }

    /// Counters of the most recent [`Registry::index`].
    pub fn last_stats(&self) -> IndexStats {
        *self.stats.lock()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kinds", &self.kinds())
            .field("last_stats", &self.last_stats())
            .finish_non_exhaustive()
    }
}

/// Indexing step for one declaration: untagged ones are skipped silently.
fn scan(decl: &HandlerDecl, stats: &mut IndexStats, staged: &mut Vec<Arc<HandlerWrapper>>) {
    stats.handlers_scanned += 1;
    if decl.tags().is_empty() {
        return;
    }

    let Staged { wrappers, errors } = stage(decl);
    for err in &errors {
        warn!(label = err.as_label(), "skipping handler: {err}");
    }
    stats.invalid += errors.len();
    if !wrappers.is_empty() {
        stats.registered += 1;
        stats.duplicate += wrappers.len();
        staged.extend(wrappers);
    }
}

fn stage(decl: &HandlerDecl) -> Staged {
    let param = match decl.check_signature() {
        Ok(param) => param,
        Err(err) => {
            return Staged {
                wrappers: Vec::new(),
                errors: vec![err],
            };
        }
    };

    let mut staged = Staged {
        wrappers: Vec::with_capacity(decl.tags().len()),
        errors: Vec::new(),
    };
    for &tag in decl.tags() {
        match decl.check_tag(tag, param) {
            Ok(()) => staged
                .wrappers
                .push(Arc::new(HandlerWrapper::wrap(decl, tag, param))),
            Err(err) => staged.errors.push(err),
        }
    }
    staged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModuleLoadError;
    use crate::events::fixtures::{MainMenuLoaded, SceneLoaded};
    use crate::events::{Event, GameLoaded, GameStarted};
    use crate::registry::handler::{AnyEvent, HandlerFn, ParamType};
    use crate::registry::module::{HandlerGroup, ModuleList, StaticModule};

    fn noop(name: &'static str) -> HandlerDecl {
        HandlerDecl::new(name, HandlerFn::no_args(|| Ok(())))
    }

    fn startup_module() -> StaticModule {
        StaticModule::new("core").with_group(
            HandlerGroup::new("Startup")
                .with(noop("on_load").subscribe::<GameLoaded>())
                .with(
                    HandlerDecl::new(
                        "announce",
                        HandlerFn::with_event::<AnyEvent, _>(|_ev: &dyn Event| Ok(())),
                    )
                    .subscribe::<GameLoaded>()
                    .subscribe::<GameStarted>(),
                )
                .with(noop("not_a_handler"))
                .with(noop("method").subscribe::<GameLoaded>().on_instance())
                .with(
                    noop("two_params")
                        .subscribe::<GameLoaded>()
                        .declared_params(vec![
                            ParamType::Event(EventKind::of::<GameLoaded>()),
                            ParamType::foreign::<u32>(),
                        ]),
                ),
        )
    }

    fn registry_with(module: StaticModule) -> Registry {
        Registry::new(Arc::new(ModuleList::new().with(module)))
    }

    #[test]
    fn index_registers_valid_handlers_and_counts_the_rest() {
        let reg = registry_with(startup_module());
        let stats = reg.index();

        assert_eq!(reg.handler_count(EventKind::of::<GameLoaded>()), 2);
        assert_eq!(reg.handler_count(EventKind::of::<GameStarted>()), 1);
        assert_eq!(stats.modules_scanned, 1);
        assert_eq!(stats.groups_scanned, 1);
        assert_eq!(stats.handlers_scanned, 5);
        assert_eq!(stats.invalid, 2);
        assert_eq!(stats.registered, 2);
        assert_eq!(stats.duplicate, 3);
        assert_eq!(reg.last_stats(), stats);
    }

    #[test]
    fn indexing_twice_yields_the_same_table() {
        let reg = registry_with(startup_module());
        let first_stats = reg.index();
        let first = reg.describe();
        let second_stats = reg.index();

        assert_eq!(first, reg.describe());
        assert_eq!(first_stats, second_stats);
        assert_eq!(reg.handler_count(EventKind::of::<GameLoaded>()), 2);
    }

    #[test]
    fn reindex_drops_unloaded_modules() {
        let modules = Arc::new(ModuleList::new().with(startup_module()));
        let reg = Registry::new(modules.clone());
        reg.index();
        assert_eq!(reg.kinds().len(), 2);

        modules.unload("core");
        reg.index();
        assert!(reg.kinds().is_empty());
        assert_eq!(reg.handler_count(EventKind::of::<GameLoaded>()), 0);
    }

    #[test]
    fn same_kind_tagged_twice_registers_twice() {
        let reg = registry_with(StaticModule::new("m").with_group(
            HandlerGroup::new("G").with(
                noop("twice")
                    .subscribe::<GameLoaded>()
                    .subscribe::<GameLoaded>(),
            ),
        ));
        let stats = reg.index();
        assert_eq!(reg.handler_count(EventKind::of::<GameLoaded>()), 2);
        assert_eq!(stats.registered, 1);
        assert_eq!(stats.duplicate, 2);
    }

    #[test]
    fn unassignable_tags_are_rejected_individually() {
        let reg = registry_with(StaticModule::new("m").with_group(
            HandlerGroup::new("Scenes").with(
                HandlerDecl::new(
                    "scene_handler",
                    HandlerFn::with_event::<SceneLoaded, _>(|_ev: &SceneLoaded| Ok(())),
                )
                .subscribe::<MainMenuLoaded>()
                .subscribe::<GameStarted>(),
            ),
        ));
        let stats = reg.index();
        assert_eq!(reg.handler_count(EventKind::of::<MainMenuLoaded>()), 1);
        assert_eq!(reg.handler_count(EventKind::of::<GameStarted>()), 0);
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.registered, 1);
    }

    struct Broken;

    impl HandlerModule for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn groups(&self) -> Result<Vec<HandlerGroup>, ModuleLoadError> {
            Err(ModuleLoadError {
                module: "broken".into(),
                reason: "missing dependency".into(),
                recovered: vec![HandlerGroup::new("Survivor").with(noop("kept").subscribe::<GameStarted>())],
            })
        }
    }

    #[test]
    fn partial_modules_contribute_recovered_groups() {
        let modules = ModuleList::new().with(Broken).with(startup_module());
        let reg = Registry::new(Arc::new(modules));
        let stats = reg.index();

        assert_eq!(stats.modules_scanned, 2);
        assert_eq!(stats.partial_modules, 1);
        assert_eq!(reg.handler_count(EventKind::of::<GameStarted>()), 2);
    }

    struct Explodes;

    impl HandlerModule for Explodes {
        fn name(&self) -> &str {
            "explodes"
        }

        fn groups(&self) -> Result<Vec<HandlerGroup>, ModuleLoadError> {
            panic!("corrupt module image")
        }
    }

    struct PanickingSource;

    impl ModuleSource for PanickingSource {
        fn modules(&self) -> Vec<Arc<dyn HandlerModule>> {
            panic!("module enumeration failed")
        }
    }

    #[test]
    fn panicking_modules_are_skipped() {
        let modules = ModuleList::new().with(Explodes).with(startup_module());
        let reg = Registry::new(Arc::new(modules));
        let stats = std::panic::catch_unwind(AssertUnwindSafe(|| reg.index()));

        let stats = match stats {
            Ok(stats) => stats,
            Err(_) => panic!("index let a module panic escape"),
        };
        assert_eq!(stats.modules_scanned, 2);
        assert_eq!(stats.partial_modules, 1);
        assert_eq!(reg.handler_count(EventKind::of::<GameLoaded>()), 2);
    }

    #[test]
    fn panicking_source_keeps_runtime_subscriptions() {
        let reg = Registry::new(Arc::new(PanickingSource));
        assert_eq!(reg.subscribe(noop("late").subscribe::<GameStarted>()), Ok(1));

        let stats = reg.index();
        assert_eq!(stats.modules_scanned, 0);
        assert_eq!(reg.handler_count(EventKind::of::<GameStarted>()), 1);
    }

    #[test]
    fn runtime_subscriptions_survive_reindex() {
        let reg = Registry::empty();
        assert_eq!(reg.subscribe(noop("late").subscribe::<GameStarted>()), Ok(1));
        assert_eq!(reg.handler_count(EventKind::of::<GameStarted>()), 1);

        reg.index();
        assert_eq!(reg.handler_count(EventKind::of::<GameStarted>()), 1);
        assert_eq!(reg.last_stats().registered, 1);
    }

    #[test]
    fn invalid_runtime_subscriptions_are_reported() {
        let reg = Registry::empty();
        let errors = reg.subscribe(noop("untagged")).err().unwrap_or_default();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].as_label(), "registration_untagged");

        let errors = reg
            .subscribe(noop("method").subscribe::<GameLoaded>().on_instance())
            .err()
            .unwrap_or_default();
        assert_eq!(errors[0].as_label(), "registration_not_static");
        assert!(reg.kinds().is_empty());
    }
}
