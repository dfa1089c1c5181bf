//! # Handler wrappers.
//!
//! Indexing turns every valid (declaration, tag) pair into a
//! [`HandlerWrapper`]: one of four shapes normalized behind a single
//! [`invoke`](HandlerWrapper::invoke) contract. Wrappers are immutable and live
//! until the next re-index replaces them.
//!
//! ```text
//!                    returns nothing        returns a value
//!   no parameter     VoidNoParams           ReturnsNoParams
//!   one parameter    VoidParam<P>           ReturnsParam<P>
//! ```

use std::borrow::Cow;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::error::{HandlerError, panic_info};
use crate::events::{Event, EventKind};

use super::handler::{Callable, EventArgFn, HandlerDecl};

/// Global counter for wrapper identities.
static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one wrapper inside a registry set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        HandlerId(NEXT_HANDLER_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Fields shared by every wrapper shape.
#[derive(Debug, Clone)]
pub struct WrapperMeta {
    /// Wrapper identity.
    pub id: HandlerId,
    /// Name of the wrapped declaration.
    pub name: Cow<'static, str>,
    /// Kind this wrapper was registered for.
    pub kind: EventKind,
}

/// A registered, invocable handler.
///
/// The shape follows the declared signature. Every body is stored behind the
/// event-taking call; parameterless bodies ignore the event.
pub enum HandlerWrapper {
    /// No parameter, no value.
    VoidNoParams {
        /// Shared fields.
        meta: WrapperMeta,
        /// Body.
        f: EventArgFn,
    },
    /// No parameter, value discarded.
    ReturnsNoParams {
        /// Shared fields.
        meta: WrapperMeta,
        /// Body.
        f: EventArgFn,
    },
    /// One event parameter, no value.
    VoidParam {
        /// Shared fields.
        meta: WrapperMeta,
        /// Declared parameter kind.
        param: EventKind,
        /// Body.
        f: EventArgFn,
    },
    /// One event parameter, value discarded.
    ReturnsParam {
        /// Shared fields.
        meta: WrapperMeta,
        /// Declared parameter kind.
        param: EventKind,
        /// Body.
        f: EventArgFn,
    },
}

impl HandlerWrapper {
    /// Wraps `decl` for subscription `kind`.
    ///
    /// `param` is the declared parameter kind as returned by signature validation.
    pub(crate) fn wrap(decl: &HandlerDecl, kind: EventKind, param: Option<EventKind>) -> Self {
        let meta = WrapperMeta {
            id: HandlerId::next(),
            name: decl.name_cow().clone(),
            kind,
        };
        let f = match decl.callable() {
            Callable::NoArgs(body) => {
                let body = body.clone();
                Arc::new(move |_ev: &dyn Event| body()) as EventArgFn
            }
            Callable::EventArg(body) => body.clone(),
        };
        match (param, decl.returns()) {
            (None, false) => HandlerWrapper::VoidNoParams { meta, f },
            (None, true) => HandlerWrapper::ReturnsNoParams { meta, f },
            (Some(param), false) => HandlerWrapper::VoidParam { meta, param, f },
            (Some(param), true) => HandlerWrapper::ReturnsParam { meta, param, f },
        }
    }

    /// Shared fields.
    pub fn meta(&self) -> &WrapperMeta {
        match self {
            HandlerWrapper::VoidNoParams { meta, .. }
            | HandlerWrapper::ReturnsNoParams { meta, .. }
            | HandlerWrapper::VoidParam { meta, .. }
            | HandlerWrapper::ReturnsParam { meta, .. } => meta,
        }
    }

    /// Wrapper identity.
    #[inline]
    pub fn id(&self) -> HandlerId {
        self.meta().id
    }

    /// Name of the wrapped declaration.
    #[inline]
    pub fn name(&self) -> &str {
        &self.meta().name
    }

    /// Shape label, e.g. `"VoidParam"`.
    pub fn shape(&self) -> &'static str {
        match self {
            HandlerWrapper::VoidNoParams { .. } => "VoidNoParams",
            HandlerWrapper::ReturnsNoParams { .. } => "ReturnsNoParams",
            HandlerWrapper::VoidParam { .. } => "VoidParam",
            HandlerWrapper::ReturnsParam { .. } => "ReturnsParam",
        }
    }

    /// Invokes the handler with `ev`.
    ///
    /// Errors returned by the body and panics are both turned into [`HandlerError`].
    pub fn invoke(&self, ev: &dyn Event) -> Result<(), HandlerError> {
        let f = match self {
            HandlerWrapper::VoidNoParams { f, .. }
            | HandlerWrapper::ReturnsNoParams { f, .. }
            | HandlerWrapper::VoidParam { f, .. }
            | HandlerWrapper::ReturnsParam { f, .. } => f,
        };
        let res = catch_unwind(AssertUnwindSafe(|| f(ev)));
        let name = &self.meta().name;
        match res {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.with_handler(name)),
            Err(payload) => Err(HandlerError::Panicked {
                handler: name.clone(),
                info: panic_info(payload.as_ref()),
            }),
        }
    }
}

impl fmt::Display for HandlerWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerWrapper::VoidParam { param, .. } | HandlerWrapper::ReturnsParam { param, .. } => {
                write!(f, "{}<{}>({})", self.shape(), param, self.name())
            }
            _ => write!(f, "{}({})", self.shape(), self.name()),
        }
    }
}

impl fmt::Debug for HandlerWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerWrapper")
            .field("shape", &self.shape())
            .field("meta", self.meta())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GameLoaded;
    use crate::registry::handler::{AnyEvent, HandlerFn, ParamType};

    fn wrap(decl: HandlerDecl) -> HandlerWrapper {
        let param = decl.check_signature().ok().flatten();
        HandlerWrapper::wrap(&decl, EventKind::of::<GameLoaded>(), param)
    }

    #[test]
    fn shapes_follow_signature() {
        let shapes: Vec<&'static str> = [
            HandlerFn::no_args(|| Ok(())),
            HandlerFn::no_args_returning(|| Ok(5_u8)),
            HandlerFn::with_event::<GameLoaded, _>(|_ev: &GameLoaded| Ok(())),
            HandlerFn::with_event_returning::<AnyEvent, _, _>(|ev: &dyn Event| {
                Ok(ev.id().len())
            }),
        ]
        .into_iter()
        .map(|f| wrap(HandlerDecl::new("h", f).subscribe::<GameLoaded>()).shape())
        .collect();

        assert_eq!(
            shapes,
            ["VoidNoParams", "ReturnsNoParams", "VoidParam", "ReturnsParam"]
        );
    }

    #[test]
    fn shapes_follow_declared_params_not_the_body() {
        let declared_event = wrap(
            HandlerDecl::new("typed_noop", HandlerFn::no_args(|| Ok(())))
                .subscribe::<GameLoaded>()
                .declared_params(vec![ParamType::Event(EventKind::of::<GameLoaded>())]),
        );
        assert_eq!(declared_event.to_string(), "VoidParam<GameLoaded>(typed_noop)");
        assert!(declared_event.invoke(&GameLoaded::new("t")).is_ok());

        let declared_none = wrap(
            HandlerDecl::new(
                "untyped",
                HandlerFn::with_event::<AnyEvent, _>(|_ev: &dyn Event| Ok(())),
            )
            .subscribe::<GameLoaded>()
            .declared_params(Vec::new()),
        );
        assert_eq!(declared_none.shape(), "VoidNoParams");
        assert!(declared_none.invoke(&GameLoaded::new("t")).is_ok());
    }

    #[test]
    fn every_wrap_gets_a_fresh_identity() {
        let decl = HandlerDecl::new("h", HandlerFn::no_args(|| Ok(()))).subscribe::<GameLoaded>();
        let a = wrap(decl.clone());
        let b = wrap(decl);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn failures_are_named_after_the_handler() {
        let w = wrap(
            HandlerDecl::new(
                "loader::check",
                HandlerFn::no_args(|| Err(HandlerError::fail("missing asset"))),
            )
            .subscribe::<GameLoaded>(),
        );
        let err = w.invoke(&GameLoaded::new("t")).err();
        assert_eq!(err.as_ref().map(HandlerError::handler), Some("loader::check"));
    }

    #[test]
    fn panics_are_caught() {
        let w = wrap(
            HandlerDecl::new("explodes", HandlerFn::no_args(|| panic!("kaboom")))
                .subscribe::<GameLoaded>(),
        );
        match w.invoke(&GameLoaded::new("t")) {
            Err(HandlerError::Panicked { handler, info }) => {
                assert_eq!(handler, "explodes");
                assert_eq!(info, "kaboom");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn display_includes_parameter_kind() {
        let w = wrap(
            HandlerDecl::new(
                "on_load",
                HandlerFn::with_event::<GameLoaded, _>(|_ev: &GameLoaded| Ok(())),
            )
            .subscribe::<GameLoaded>(),
        );
        assert_eq!(w.to_string(), "VoidParam<GameLoaded>(on_load)");
    }
}
