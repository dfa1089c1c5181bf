use std::fmt;

/// Counters collected by one [`Registry::index`](crate::Registry::index) pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    /// Modules enumerated.
    pub modules_scanned: usize,
    /// Modules that reported a partial load.
    pub partial_modules: usize,
    /// Handler groups enumerated.
    pub groups_scanned: usize,
    /// Declarations enumerated, tagged or not.
    pub handlers_scanned: usize,
    /// Rule violations (one per rejected declaration or rejected tag).
    pub invalid: usize,
    /// Declarations with at least one registered tag.
    pub registered: usize,
    /// Wrappers added to the table (one per registered tag).
    pub duplicate: usize,
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "modules={} partial={} groups={} handlers={} invalid={} registered={} duplicate={}",
            self.modules_scanned,
            self.partial_modules,
            self.groups_scanned,
            self.handlers_scanned,
            self.invalid,
            self.registered,
            self.duplicate
        )
    }
}
