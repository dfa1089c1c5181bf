//! # Handler modules and module sources.
//!
//! The registry never inspects code at runtime. Instead, each loaded module
//! implements [`HandlerModule`] and hands over its handler declarations,
//! grouped the way the module organizes them ([`HandlerGroup`]). A
//! [`ModuleSource`] enumerates the currently loaded modules and is queried on
//! every [`Registry::index`](crate::Registry::index).
//!
//! ```text
//! ModuleSource ──► [HandlerModule] ──► [HandlerGroup] ──► [HandlerDecl]
//!  (enumerator)       (assembly)          (type)           (method)
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::ModuleLoadError;

use super::handler::HandlerDecl;

/// A named group of handler declarations.
#[derive(Debug, Clone)]
pub struct HandlerGroup {
    name: Cow<'static, str>,
    handlers: Vec<HandlerDecl>,
}

impl HandlerGroup {
    /// Creates an empty group.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    /// Adds a declaration.
    pub fn with(mut self, decl: HandlerDecl) -> Self {
        self.handlers.push(decl);
        self
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in this group.
    pub fn handlers(&self) -> &[HandlerDecl] {
        &self.handlers
    }
}

/// A loaded module exposing handler declarations.
pub trait HandlerModule: Send + Sync {
    /// Module name used in logs.
    fn name(&self) -> &str;

    /// Enumerates the module's groups.
    ///
    /// A module that can only partially enumerate itself returns a
    /// [`ModuleLoadError`] carrying the groups it did recover.
    fn groups(&self) -> Result<Vec<HandlerGroup>, ModuleLoadError>;
}

/// Enumerates the currently loaded modules.
pub trait ModuleSource: Send + Sync {
    /// Modules to scan, in scan order.
    fn modules(&self) -> Vec<Arc<dyn HandlerModule>>;
}

impl ModuleSource for Vec<Arc<dyn HandlerModule>> {
    fn modules(&self) -> Vec<Arc<dyn HandlerModule>> {
        self.clone()
    }
}

/// A module with a fixed list of groups.
#[derive(Debug, Clone)]
pub struct StaticModule {
    name: Cow<'static, str>,
    groups: Vec<HandlerGroup>,
}

impl StaticModule {
    /// Creates an empty module.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    /// Adds a group.
    pub fn with_group(mut self, group: HandlerGroup) -> Self {
        self.groups.push(group);
        self
    }
}

impl HandlerModule for StaticModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn groups(&self) -> Result<Vec<HandlerGroup>, ModuleLoadError> {
        Ok(self.groups.clone())
    }
}

/// A mutable list of loaded modules.
///
/// Hosts that load and unload modules at runtime keep one of these, mutate
/// it, and call [`Registry::index`](crate::Registry::index) afterwards.
#[derive(Default)]
pub struct ModuleList {
    modules: parking_lot::RwLock<Vec<Arc<dyn HandlerModule>>>,
}

impl ModuleList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ModuleList::load`].
    pub fn with(self, module: impl HandlerModule + 'static) -> Self {
        self.load(Arc::new(module));
        self
    }

    /// Appends a module.
    pub fn load(&self, module: Arc<dyn HandlerModule>) {
        self.modules.write().push(module);
    }

    /// Removes every module with the given name. Returns how many were removed.
    pub fn unload(&self, name: &str) -> usize {
        let mut modules = self.modules.write();
        let before = modules.len();
        modules.retain(|m| m.name() != name);
        before - modules.len()
    }

    /// Number of loaded modules.
    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    /// True if no module is loaded.
    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}

impl ModuleSource for ModuleList {
    fn modules(&self) -> Vec<Arc<dyn HandlerModule>> {
        self.modules.read().clone()
    }
}
