//! Error types used by the registry, the dispatcher and tracked tasks.
//!
//! - [`HandlerError`]: a single handler invocation failed during dispatch.
//! - [`RegistrationError`]: a handler declaration broke a signature rule.
//! - [`ModuleLoadError`]: a module could only be partially enumerated.
//! - [`TaskError`]: the body of a tracked task failed.
//! - [`TrackerError`]: a tracked task was used after it was disposed.
//! - [`RuntimeError`]: hub shutdown did not complete cleanly.
//!
//! All types provide `as_label` (stable snake_case label for logs/metrics)
//! and `as_message` helpers.

use std::borrow::Cow;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::registry::HandlerGroup;

/// # Errors produced by a handler during dispatch.
///
/// Dispatch never aborts on these: they are collected and returned once every
/// handler for the event has run.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum HandlerError {
    /// The handler reported a failure.
    #[error("handler '{handler}' failed: {error}")]
    Failed {
        /// Name of the failing handler.
        handler: Cow<'static, str>,
        /// The underlying error message.
        error: String,
    },

    /// The handler panicked; the panic was caught.
    #[error("handler '{handler}' panicked: {info}")]
    Panicked {
        /// Name of the panicking handler.
        handler: Cow<'static, str>,
        /// Panic payload rendered as text.
        info: String,
    },

    /// The event could not be viewed as the handler's parameter type.
    #[error("handler '{handler}' expects {expected}, got {actual}")]
    ArgumentMismatch {
        /// Name of the handler.
        handler: Cow<'static, str>,
        /// Parameter kind the handler declared.
        expected: &'static str,
        /// Kind of the event that was passed.
        actual: &'static str,
    },
}

impl HandlerError {
    /// Shorthand used by handler bodies: `Err(HandlerError::fail("boom"))`.
    ///
    /// The handler name is filled in by the wrapper that invoked the body.
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Failed {
            handler: Cow::Borrowed(""),
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventvisor::HandlerError;
    ///
    /// let err = HandlerError::fail("boom");
    /// assert_eq!(err.as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::ArgumentMismatch { .. } => "handler_argument_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Failed { error, .. } => format!("error: {error}"),
            HandlerError::Panicked { info, .. } => format!("panic: {info}"),
            HandlerError::ArgumentMismatch {
                expected, actual, ..
            } => format!("mismatch: expected={expected} actual={actual}"),
        }
    }

    /// Name of the handler this error came from.
    pub fn handler(&self) -> &str {
        match self {
            HandlerError::Failed { handler, .. }
            | HandlerError::Panicked { handler, .. }
            | HandlerError::ArgumentMismatch { handler, .. } => handler,
        }
    }

    /// Fills in the handler name if the body left it empty.
    pub(crate) fn with_handler(mut self, name: &Cow<'static, str>) -> Self {
        let slot = match &mut self {
            HandlerError::Failed { handler, .. }
            | HandlerError::Panicked { handler, .. }
            | HandlerError::ArgumentMismatch { handler, .. } => handler,
        };
        if slot.is_empty() {
            *slot = name.clone();
        }
        self
    }
}

/// # Signature rule violations found while indexing handlers.
///
/// These are logged, counted and skipped; indexing itself never fails.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The declaration is bound to an instance instead of being a free function.
    #[error("handler '{handler}' is bound to an instance")]
    NotStatic {
        /// Name of the declaration.
        handler: String,
    },

    /// More than one parameter was declared.
    #[error("handler '{handler}' declares {count} parameters (at most 1 allowed)")]
    TooManyParams {
        /// Name of the declaration.
        handler: String,
        /// Declared parameter count.
        count: usize,
    },

    /// The single parameter is not an event type.
    #[error("handler '{handler}' takes {param}, which is not an event type")]
    ParamNotEvent {
        /// Name of the declaration.
        handler: String,
        /// Name of the declared parameter type.
        param: &'static str,
    },

    /// A subscription tag names a kind that cannot be passed as the parameter.
    #[error("handler '{handler}' cannot receive {kind} as {param}")]
    KindNotAssignable {
        /// Name of the declaration.
        handler: String,
        /// Subscribed event kind.
        kind: &'static str,
        /// Declared parameter kind.
        param: &'static str,
    },

    /// The declaration carries no subscription tag.
    #[error("handler '{handler}' is not subscribed to any event kind")]
    Untagged {
        /// Name of the declaration.
        handler: String,
    },
}

impl RegistrationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistrationError::NotStatic { .. } => "registration_not_static",
            RegistrationError::TooManyParams { .. } => "registration_too_many_params",
            RegistrationError::ParamNotEvent { .. } => "registration_param_not_event",
            RegistrationError::KindNotAssignable { .. } => "registration_kind_not_assignable",
            RegistrationError::Untagged { .. } => "registration_untagged",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # A module could not enumerate all of its handler groups.
///
/// Carries whatever groups could still be recovered; the registry indexes
/// those and carries on.
#[derive(Error, Debug)]
#[error("module '{module}' loaded partially: {reason}")]
pub struct ModuleLoadError {
    /// Name of the module that failed.
    pub module: String,
    /// Why enumeration failed.
    pub reason: String,
    /// Groups that were loaded successfully despite the failure.
    pub recovered: Vec<HandlerGroup>,
}

impl ModuleLoadError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "module_partial_load"
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        format!(
            "module={} recovered_groups={} reason={}",
            self.module,
            self.recovered.len(),
            self.reason
        )
    }
}

/// # Errors produced by the body of a tracked task.
///
/// Captured into the task outcome; only callers awaiting the task see them.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The body returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The body panicked.
    #[error("body panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The body used its progress reporter after the task was disposed.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventvisor::TaskError;
    ///
    /// let err = TaskError::fail("disk full");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Tracker(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
            TaskError::Tracker(e) => e.as_message(),
        }
    }
}

/// # Misuse of a tracked task handle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// Progress was reported after the task completed and was disposed.
    #[error("tracked task '{name}' ({id}) already disposed")]
    Disposed {
        /// Task name.
        name: String,
        /// Task id.
        id: Uuid,
    },
}

impl TrackerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TrackerError::Disposed { .. } => "task_disposed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TrackerError::Disposed { name, id } => format!("disposed: task={name} id={id}"),
        }
    }
}

/// # Errors produced by the hub itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period elapsed while tracked tasks were still live.
    #[error("shutdown grace {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the tasks still live.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck:?}")
            }
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_info(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_shorthand_gets_handler_name_from_wrapper() {
        let name: Cow<'static, str> = Cow::Borrowed("startup::on_load");
        let err = HandlerError::fail("boom").with_handler(&name);
        assert_eq!(err.handler(), "startup::on_load");
        assert_eq!(err.to_string(), "handler 'startup::on_load' failed: boom");
    }

    #[test]
    fn named_errors_keep_their_handler() {
        let name: Cow<'static, str> = Cow::Borrowed("other");
        let err = HandlerError::Panicked {
            handler: Cow::Borrowed("first"),
            info: "oops".into(),
        }
        .with_handler(&name);
        assert_eq!(err.handler(), "first");
        assert_eq!(err.as_label(), "handler_panicked");
    }

    #[test]
    fn tracker_error_converts_into_task_error() {
        let id = Uuid::nil();
        let err: TaskError = TrackerError::Disposed {
            name: "Load".into(),
            id,
        }
        .into();
        assert_eq!(err.as_label(), "task_disposed");
        assert!(err.to_string().contains("already disposed"));
    }

    #[test]
    fn panic_payloads_render_as_text() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_info(boxed.as_ref()), "static message");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_info(boxed.as_ref()), "owned");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_info(boxed.as_ref()), "unknown panic");
    }
}
