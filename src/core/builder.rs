use std::sync::Arc;

use crate::{
    core::Config,
    registry::{HandlerModule, ModuleSource, Registry},
    subscribers::{Subscribe, SubscriberSet},
    tracker::{Bus, TaskTracker},
};

use super::hub::Hub;

/// Builder for a [`Hub`].
pub struct HubBuilder {
    cfg: Config,
    modules: Arc<dyn ModuleSource>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl HubBuilder {
    /// Creates a builder with no modules and no subscribers.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            modules: Arc::new(Vec::<Arc<dyn HandlerModule>>::new()),
            subscribers: Vec::new(),
        }
    }

    /// Sets the source of handler modules queried on every index.
    pub fn with_modules(mut self, modules: Arc<dyn ModuleSource>) -> Self {
        self.modules = modules;
        self
    }

    /// Sets lifecycle subscribers.
    ///
    /// Subscribers receive every task notification through dedicated workers
    /// with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the hub.
    ///
    /// Indexes the registry when `Config::index_on_build` is set. Must be
    /// called from within a tokio runtime when subscribers are configured.
    pub fn build(self) -> Hub {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let tracker = TaskTracker::new(&self.cfg, bus);
        let registry = Arc::new(Registry::new(self.modules));
        if self.cfg.index_on_build {
            registry.index();
        }
        let subs = SubscriberSet::new(self.subscribers);

        Hub::new_internal(self.cfg, registry, tracker, subs)
    }
}
