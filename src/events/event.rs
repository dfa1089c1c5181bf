//! # Event contract and event kinds.
//!
//! An [`Event`] is an immutable message describing something that happened.
//! Every event has an [`EventKind`], a type identifier used as the dispatch key.
//!
//! ## Kind hierarchy
//! A kind may extend another kind by **embedding** the parent event value and
//! exposing it through [`Event::parent_event`] (plus [`Event::parent_kind`] for
//! the static relation). A handler declared for a parent kind can then receive
//! the child event.
//!
//! ```text
//!            EventKind::base()        (the base abstraction, "Event")
//!                   ▲
//!              SceneLoaded            parent_kind() = None
//!                   ▲
//!            MainMenuLoaded           parent_kind() = Some(SceneLoaded)
//!                                     parent_event() = Some(&self.scene)
//! ```
//!
//! ## Example
//! ```rust
//! use std::fmt;
//! use eventvisor::{Event, EventKind};
//!
//! struct Saved { slot: u8 }
//!
//! impl fmt::Display for Saved {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         write!(f, "saved to slot {}", self.slot)
//!     }
//! }
//!
//! impl Event for Saved {
//!     fn kind(&self) -> EventKind { EventKind::of::<Self>() }
//! }
//!
//! let ev = Saved { slot: 2 };
//! assert_eq!(ev.id(), "Saved");
//! assert!(ev.kind().is_assignable_to(EventKind::base()));
//! ```

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::Level;

/// Upper bound on parent links followed before giving up on a kind chain.
const MAX_KIND_DEPTH: usize = 64;

/// Contract for every event kind.
///
/// Implementations should be plain information carriers.
pub trait Event: Any + Send + Sync + fmt::Display {
    /// Kind of this event. Implement as `EventKind::of::<Self>()`.
    fn kind(&self) -> EventKind;

    /// String identifier, e.g. `"GameLoaded"`. Defaults to the kind name.
    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.kind().name())
    }

    /// Level at which firing this event is logged.
    ///
    /// `None` (the default) disables the log line entirely; use it for
    /// high-frequency events such as frame ticks.
    fn firing_level(&self) -> Option<Level> {
        None
    }

    /// The embedded parent event, if this kind extends another kind.
    fn parent_event(&self) -> Option<&dyn Event> {
        None
    }

    /// Static counterpart of [`Event::parent_event`].
    fn parent_kind() -> Option<EventKind>
    where
        Self: Sized,
    {
        None
    }
}

impl fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id())
            .field("kind", &self.kind().name())
            .field("text", &self.to_string())
            .finish()
    }
}

/// Type identifier of an event kind.
///
/// Equality and hashing use the underlying [`TypeId`] only.
#[derive(Clone, Copy)]
pub struct EventKind {
    id: TypeId,
    name: &'static str,
    parent: fn() -> Option<EventKind>,
}

impl EventKind {
    /// Kind of the concrete event type `E`.
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: short_type_name(std::any::type_name::<E>()),
            parent: E::parent_kind,
        }
    }

    /// The base event abstraction every kind is assignable to.
    pub fn base() -> Self {
        Self {
            id: TypeId::of::<dyn Event>(),
            name: "Event",
            parent: no_parent,
        }
    }

    /// Short type name (no module path).
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True for [`EventKind::base`].
    #[inline]
    pub fn is_base(&self) -> bool {
        self.id == TypeId::of::<dyn Event>()
    }

    /// The kind this kind extends, if any.
    pub fn parent(&self) -> Option<EventKind> {
        (self.parent)()
    }

    /// Returns true if an event of this kind can be passed where `target` is expected.
    ///
    /// Every kind is assignable to itself, to each of its ancestors and to the base.
    /// The base is assignable only to itself.
    pub fn is_assignable_to(&self, target: EventKind) -> bool {
        if target.is_base() {
            return true;
        }
        let mut current = Some(*self);
        for _ in 0..MAX_KIND_DEPTH {
            match current {
                Some(kind) if kind == target => return true,
                Some(kind) => current = kind.parent(),
                None => return false,
            }
        }
        false
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKind {}

impl Hash for EventKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKind({})", self.name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn no_parent() -> Option<EventKind> {
    None
}

/// `a::b::Foo<c::Bar>` → `Foo`.
fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head)
}

/// Views `ev` (or one of its embedded parents) as the concrete type `T`.
pub(crate) fn downcast_chain<T: Event>(ev: &dyn Event) -> Option<&T> {
    let mut current = Some(ev);
    for _ in 0..MAX_KIND_DEPTH {
        let e = current?;
        let any: &dyn Any = e;
        if let Some(hit) = any.downcast_ref::<T>() {
            return Some(hit);
        }
        current = e.parent_event();
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct SceneLoaded {
        pub(crate) scene: &'static str,
    }

    impl fmt::Display for SceneLoaded {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "scene {} loaded", self.scene)
        }
    }

    impl Event for SceneLoaded {
        fn kind(&self) -> EventKind {
            EventKind::of::<Self>()
        }
    }

    pub(crate) struct MainMenuLoaded {
        pub(crate) scene: SceneLoaded,
        pub(crate) buttons: u32,
    }

    impl fmt::Display for MainMenuLoaded {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "main menu loaded with {} buttons", self.buttons)
        }
    }

    impl Event for MainMenuLoaded {
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

    pub(crate) fn main_menu() -> MainMenuLoaded {
        MainMenuLoaded {
            scene: SceneLoaded { scene: "main_menu" },
            buttons: 3,
        }
    }

    #[test]
    fn id_defaults_to_short_kind_name() {
        let ev = main_menu();
        assert_eq!(ev.id(), "MainMenuLoaded");
        assert_eq!(EventKind::of::<SceneLoaded>().name(), "SceneLoaded");
    }

    #[test]
    fn child_kind_is_assignable_to_parent_and_base() {
        let child = EventKind::of::<MainMenuLoaded>();
        let parent = EventKind::of::<SceneLoaded>();

        assert!(child.is_assignable_to(parent));
        assert!(child.is_assignable_to(child));
        assert!(child.is_assignable_to(EventKind::base()));
        assert!(!parent.is_assignable_to(child));
        assert!(!EventKind::base().is_assignable_to(parent));
        assert!(EventKind::base().is_assignable_to(EventKind::base()));
    }

    #[test]
    fn downcast_walks_embedded_parents() {
        let ev = main_menu();
        let dynamic: &dyn Event = &ev;

        let as_child = downcast_chain::<MainMenuLoaded>(dynamic).map(|e| e.buttons);
        assert_eq!(as_child, Some(3));

        let as_parent = downcast_chain::<SceneLoaded>(dynamic).map(|e| e.scene);
        assert_eq!(as_parent, Some("main_menu"));

        let scene = SceneLoaded { scene: "x" };
        assert!(downcast_chain::<MainMenuLoaded>(&scene).is_none());
    }

    #[test]
    fn short_names_strip_paths_and_generics() {
        assert_eq!(short_type_name("a::b::Foo"), "Foo");
        assert_eq!(short_type_name("a::Foo<b::Bar>"), "Foo");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
