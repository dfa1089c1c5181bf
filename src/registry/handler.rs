//! # Handler declarations.
//!
//! A [`HandlerDecl`] is what a loaded module exposes for each function that
//! wants to react to events: its name, the event kinds it subscribes to, how
//! it is bound, the parameter list it declares and the callable body.
//!
//! Bodies are built with [`HandlerFn`], which covers the four supported
//! shapes:
//!
//! | constructor                        | parameters      | returns a value |
//! |------------------------------------|-----------------|-----------------|
//! | [`HandlerFn::no_args`]             | none            | no              |
//! | [`HandlerFn::no_args_returning`]   | none            | yes (discarded) |
//! | [`HandlerFn::with_event`]          | one event param | no              |
//! | [`HandlerFn::with_event_returning`]| one event param | yes (discarded) |
//!
//! ## Example
//! ```rust
//! use eventvisor::{AnyEvent, Event, GameLoaded, GameStarted, HandlerDecl, HandlerFn};
//!
//! // Subscribed to two kinds, receives the base abstraction.
//! let decl = HandlerDecl::new(
//!     "startup::announce",
//!     HandlerFn::with_event::<AnyEvent, _>(|ev: &dyn Event| {
//!         println!("{}", ev.id());
//!         Ok(())
//!     }),
//! )
//! .subscribe::<GameLoaded>()
//! .subscribe::<GameStarted>();
//!
//! assert_eq!(decl.tags().len(), 2);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::{HandlerError, RegistrationError};
use crate::events::{Event, EventKind, downcast_chain};

/// Result returned by every handler body.
pub type HandlerResult = Result<(), HandlerError>;

pub(crate) type NoArgsFn = Arc<dyn Fn() -> HandlerResult + Send + Sync>;
pub(crate) type EventArgFn = Arc<dyn Fn(&dyn Event) -> HandlerResult + Send + Sync>;

/// How a declared handler is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Free function; the only binding the registry accepts.
    Static,
    /// Method that needs an instance to be called.
    Instance,
}

/// Type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// An event kind, or the base abstraction ([`EventKind::base`]).
    Event(EventKind),
    /// Any other type, by name.
    Foreign(&'static str),
}

impl ParamType {
    /// Parameter of a non-event type `T`.
    pub fn foreign<T: ?Sized>() -> Self {
        ParamType::Foreign(std::any::type_name::<T>())
    }

    /// Display name of the parameter type.
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::Event(kind) => kind.name(),
            ParamType::Foreign(name) => name,
        }
    }
}

/// A type a handler can take as its single parameter.
///
/// Implemented for every concrete [`Event`] and for [`AnyEvent`], the marker
/// for the base abstraction.
pub trait EventParam: 'static {
    /// The reference target handed to the handler.
    type Target: ?Sized;

    /// Declared parameter kind.
    fn kind() -> EventKind;

    /// Views a dispatched event as the parameter type.
    fn cast(ev: &dyn Event) -> Option<&Self::Target>;
}

/// Parameter marker for handlers that accept any event as `&dyn Event`.
#[derive(Debug, Clone, Copy)]
pub struct AnyEvent;

impl EventParam for AnyEvent {
    type Target = dyn Event;

    fn kind() -> EventKind {
        EventKind::base()
    }

    fn cast(ev: &dyn Event) -> Option<&Self::Target> {
        Some(ev)
    }
}

impl<T: Event> EventParam for T {
    type Target = T;

    fn kind() -> EventKind {
        EventKind::of::<T>()
    }

    fn cast(ev: &dyn Event) -> Option<&Self::Target> {
        downcast_chain::<T>(ev)
    }
}

#[derive(Clone)]
pub(crate) enum Callable {
    NoArgs(NoArgsFn),
    EventArg(EventArgFn),
}

/// A handler body together with its natural signature.
#[derive(Clone)]
pub struct HandlerFn {
    params: Vec<ParamType>,
    returns: bool,
    call: Callable,
}

impl HandlerFn {
    /// No parameters, no value.
    pub fn no_args<F>(f: F) -> Self
    where
        F: Fn() -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            returns: false,
            call: Callable::NoArgs(Arc::new(f)),
        }
    }

    /// No parameters, returns a value that the dispatcher discards.
    pub fn no_args_returning<F, R>(f: F) -> Self
    where
        F: Fn() -> Result<R, HandlerError> + Send + Sync + 'static,
        R: 'static,
    {
        Self {
            params: Vec::new(),
            returns: true,
            call: Callable::NoArgs(Arc::new(move || f().map(drop))),
        }
    }

    /// One event parameter of type `P`, no value.
    pub fn with_event<P, F>(f: F) -> Self
    where
        P: EventParam,
        F: Fn(&P::Target) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            params: vec![ParamType::Event(P::kind())],
            returns: false,
            call: Callable::EventArg(Arc::new(move |ev: &dyn Event| match P::cast(ev) {
                Some(arg) => f(arg),
                None => Err(mismatch::<P>(ev)),
            })),
        }
    }

    /// One event parameter of type `P`, returns a value that the dispatcher discards.
    pub fn with_event_returning<P, F, R>(f: F) -> Self
    where
        P: EventParam,
        F: Fn(&P::Target) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: 'static,
    {
        Self {
            params: vec![ParamType::Event(P::kind())],
            returns: true,
            call: Callable::EventArg(Arc::new(move |ev: &dyn Event| match P::cast(ev) {
                Some(arg) => f(arg).map(drop),
                None => Err(mismatch::<P>(ev)),
            })),
        }
    }
}

fn mismatch<P: EventParam>(ev: &dyn Event) -> HandlerError {
    HandlerError::ArgumentMismatch {
        handler: Cow::Borrowed(""),
        expected: P::kind().name(),
        actual: ev.kind().name(),
    }
}

/// A handler as declared by a loaded module.
#[derive(Clone)]
pub struct HandlerDecl {
    name: Cow<'static, str>,
    tags: Vec<EventKind>,
    receiver: Receiver,
    params: Vec<ParamType>,
    returns: bool,
    call: Callable,
}

impl HandlerDecl {
    /// Declares a free-function handler with the signature of `f` and no tags yet.
    pub fn new(name: impl Into<Cow<'static, str>>, f: HandlerFn) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            receiver: Receiver::Static,
            params: f.params,
            returns: f.returns,
            call: f.call,
        }
    }

    /// Adds a subscription tag for kind `E`. May be repeated.
    pub fn subscribe<E: Event>(self) -> Self {
        self.subscribe_kind(EventKind::of::<E>())
    }

    /// Adds a subscription tag for `kind`. May be repeated.
    pub fn subscribe_kind(mut self, kind: EventKind) -> Self {
        self.tags.push(kind);
        self
    }

    /// Marks the declaration as bound to an instance.
    pub fn on_instance(mut self) -> Self {
        self.receiver = Receiver::Instance;
        self
    }

    /// Overrides the declared parameter list.
    ///
    /// Used by modules whose declarations describe signatures that the body
    /// itself cannot express (extra or non-event parameters).
    pub fn declared_params(mut self, params: Vec<ParamType>) -> Self {
        self.params = params;
        self
    }

    /// Handler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_cow(&self) -> &Cow<'static, str> {
        &self.name
    }

    /// Subscription tags, in declaration order.
    pub fn tags(&self) -> &[EventKind] {
        &self.tags
    }

    /// Binding of the declaration.
    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    /// Declared parameters.
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// True if the body returns a value.
    pub fn returns(&self) -> bool {
        self.returns
    }

    pub(crate) fn callable(&self) -> &Callable {
        &self.call
    }

    /// Checks the tag-independent rules.
    ///
    /// Returns the declared parameter kind, `None` for parameterless handlers.
    pub(crate) fn check_signature(&self) -> Result<Option<EventKind>, RegistrationError> {
        if self.tags.is_empty() {
            return Err(RegistrationError::Untagged {
                handler: self.name.to_string(),
            });
        }
        if self.receiver != Receiver::Static {
            return Err(RegistrationError::NotStatic {
                handler: self.name.to_string(),
            });
        }
        match self.params.as_slice() {
            [] => Ok(None),
            [ParamType::Event(kind)] => Ok(Some(*kind)),
            [ParamType::Foreign(param)] => Err(RegistrationError::ParamNotEvent {
                handler: self.name.to_string(),
                param: *param,
            }),
            params => Err(RegistrationError::TooManyParams {
                handler: self.name.to_string(),
                count: params.len(),
            }),
        }
    }

    /// Checks that `tag` can be passed as the declared parameter.
    pub(crate) fn check_tag(
        &self,
        tag: EventKind,
        param: Option<EventKind>,
    ) -> Result<(), RegistrationError> {
        match param {
            Some(param) if !tag.is_assignable_to(param) => {
                Err(RegistrationError::KindNotAssignable {
                    handler: self.name.to_string(),
                    kind: tag.name(),
                    param: param.name(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for HandlerDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDecl")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("receiver", &self.receiver)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::fixtures::{MainMenuLoaded, SceneLoaded};
    use crate::events::{GameLoaded, GameStarted};

    fn noop() -> HandlerFn {
        HandlerFn::no_args(|| Ok(()))
    }

    #[test]
    fn constructors_record_natural_signature() {
        let f = HandlerFn::with_event_returning::<GameLoaded, _, _>(|ev: &GameLoaded| {
            Ok(ev.title.len())
        });
        let decl = HandlerDecl::new("count_title", f).subscribe::<GameLoaded>();

        assert_eq!(decl.params(), &[ParamType::Event(EventKind::of::<GameLoaded>())]);
        assert!(decl.returns());
        assert_eq!(decl.receiver(), Receiver::Static);
        assert_eq!(decl.check_signature(), Ok(Some(EventKind::of::<GameLoaded>())));
    }

    #[test]
    fn untagged_declarations_are_rejected() {
        let decl = HandlerDecl::new("lonely", noop());
        assert!(matches!(
            decl.check_signature(),
            Err(RegistrationError::Untagged { .. })
        ));
    }

    #[test]
    fn instance_bound_declarations_are_rejected() {
        let decl = HandlerDecl::new("method", noop())
            .subscribe::<GameLoaded>()
            .on_instance();
        assert!(matches!(
            decl.check_signature(),
            Err(RegistrationError::NotStatic { .. })
        ));
    }

    #[test]
    fn parameter_rules() {
        let too_many = HandlerDecl::new("three", noop())
            .subscribe::<GameLoaded>()
            .declared_params(vec![ParamType::foreign::<u32>(); 3]);
        assert!(matches!(
            too_many.check_signature(),
            Err(RegistrationError::TooManyParams { count: 3, .. })
        ));

        let foreign = HandlerDecl::new("object", noop())
            .subscribe::<GameLoaded>()
            .declared_params(vec![ParamType::foreign::<String>()]);
        assert!(matches!(
            foreign.check_signature(),
            Err(RegistrationError::ParamNotEvent { .. })
        ));
    }

    #[test]
    fn tags_must_be_assignable_to_the_parameter() {
        let decl = HandlerDecl::new(
            "scene_only",
            HandlerFn::with_event::<SceneLoaded, _>(|_ev: &SceneLoaded| Ok(())),
        )
        .subscribe::<MainMenuLoaded>()
        .subscribe::<GameStarted>();

        let param = decl.check_signature().ok().flatten();
        assert_eq!(param, Some(EventKind::of::<SceneLoaded>()));
        assert!(decl.check_tag(EventKind::of::<MainMenuLoaded>(), param).is_ok());
        assert!(decl.check_tag(EventKind::of::<GameStarted>(), param).is_err());
        assert!(decl.check_tag(EventKind::base(), param).is_err());
    }

    #[test]
    fn base_parameter_accepts_every_tag() {
        let decl = HandlerDecl::new(
            "any",
            HandlerFn::with_event::<AnyEvent, _>(|_ev: &dyn Event| Ok(())),
        )
        .subscribe::<GameLoaded>();
        let param = decl.check_signature().ok().flatten();
        assert_eq!(param, Some(EventKind::base()));
        assert!(decl.check_tag(EventKind::of::<GameLoaded>(), param).is_ok());
        assert!(decl.check_tag(EventKind::of::<MainMenuLoaded>(), param).is_ok());
    }
}
