//! # Hub configuration.
//!
//! [`Config`] centralizes the settings read once by
//! [`HubBuilder::build`](crate::HubBuilder::build).
//!
//! ## Sentinel values
//! - `grace = 0s` → shutdown does not wait for live tasks
//! - `progress_bar_segments = 0` → clamped to 1

use std::time::Duration;

use crate::tracker::TaskEventMask;

/// Configuration of a [`Hub`](crate::Hub).
///
/// ## Field semantics
/// - `bus_capacity`: lifecycle bus ring buffer size (min 1)
/// - `log_task_events`: notification kinds the tracker logs itself
/// - `index_on_build`: index the registry once while building
/// - `progress_bar_segments`: width of [`TrackedTask::progress_bar`](crate::TrackedTask::progress_bar)
/// - `grace`: how long shutdown waits for live tasks
///
/// All fields are public; prefer the helper accessors over repeating the clamps.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the lifecycle bus.
    ///
    /// Receivers lagging more than `bus_capacity` notifications skip older items.
    pub bus_capacity: usize,

    /// Which lifecycle notifications the tracker logs.
    ///
    /// Failures are logged at warn, everything else at trace. Subscribers
    /// receive every notification regardless of this mask.
    pub log_task_events: TaskEventMask,

    /// Run [`Registry::index`](crate::Registry::index) during build.
    pub index_on_build: bool,

    /// Number of segments in a rendered progress bar.
    pub progress_bar_segments: usize,

    /// Maximum time [`Hub::shutdown`](crate::Hub::shutdown) waits for live tasks.
    ///
    /// Tasks are never cancelled; those still running afterwards are reported
    /// as stuck and keep running detached.
    pub grace: Duration,
}

impl Config {
    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Progress bar width clamped to a minimum of 1.
    #[inline]
    pub fn progress_bar_segments_clamped(&self) -> usize {
        self.progress_bar_segments.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `log_task_events = ERROR` (only failures are logged)
    /// - `index_on_build = true`
    /// - `progress_bar_segments = 25`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            log_task_events: TaskEventMask::ERROR,
            index_on_build: true,
            progress_bar_segments: 25,
            grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TaskEventKind;

    #[test]
    fn defaults_log_only_failures() {
        let cfg = Config::default();
        assert!(cfg.log_task_events.contains(TaskEventKind::Error));
        assert!(!cfg.log_task_events.contains(TaskEventKind::ProgressUpdated));
        assert_eq!(cfg.progress_bar_segments_clamped(), 25);
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            progress_bar_segments: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.progress_bar_segments_clamped(), 1);
    }
}
