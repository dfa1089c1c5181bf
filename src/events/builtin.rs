//! Built-in event kinds fired by hosts around their own lifecycle.

use std::fmt;
use std::time::SystemTime;

use tracing::Level;

use super::event::{Event, EventKind};

/// The game (host) finished constructing and is about to run.
#[derive(Debug, Clone)]
pub struct GameLoaded {
    /// Host title.
    pub title: String,
    /// When loading finished.
    pub at: SystemTime,
}

impl GameLoaded {
    /// Creates the event stamped with the current time.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            at: SystemTime::now(),
        }
    }
}

impl fmt::Display for GameLoaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game {:?} loaded", self.title)
    }
}

impl Event for GameLoaded {
    fn kind(&self) -> EventKind {
        EventKind::of::<Self>()
    }

    fn firing_level(&self) -> Option<Level> {
        Some(Level::INFO)
    }
}

/// The game (host) started running its main loop.
#[derive(Debug, Clone)]
pub struct GameStarted {
    /// Host title.
    pub title: String,
    /// When the main loop started.
    pub at: SystemTime,
}

impl GameStarted {
    /// Creates the event stamped with the current time.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            at: SystemTime::now(),
        }
    }
}

impl fmt::Display for GameStarted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game {:?} started", self.title)
    }
}

impl Event for GameStarted {
    fn kind(&self) -> EventKind {
        EventKind::of::<Self>()
    }

    fn firing_level(&self) -> Option<Level> {
        Some(Level::INFO)
    }
}

/// One frame of the host loop. Never logged on dispatch.
#[derive(Debug, Clone, Copy)]
pub struct FrameTick {
    /// Frame counter.
    pub frame: u64,
    /// Seconds since the previous frame.
    pub delta: f32,
}

impl fmt::Display for FrameTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame {} (dt={:.4}s)", self.frame, self.delta)
    }
}

impl Event for FrameTick {
    fn kind(&self) -> EventKind {
        EventKind::of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_events_log_at_info() {
        assert_eq!(GameLoaded::new("demo").firing_level(), Some(Level::INFO));
        assert_eq!(GameStarted::new("demo").firing_level(), Some(Level::INFO));
    }

    #[test]
    fn frame_ticks_are_silent() {
        let tick = FrameTick {
            frame: 7,
            delta: 0.016,
        };
        assert_eq!(tick.firing_level(), None);
        assert_eq!(tick.id(), "FrameTick");
        assert_eq!(tick.to_string(), "frame 7 (dt=0.0160s)");
    }
}
