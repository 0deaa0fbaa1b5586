//! Handler trait and testing utilities.

use super::{HookAction, HookError};
use crate::session::Session;
use std::fmt;

/// An in-process check attached to an event.
///
/// Handlers are registered with the [`HandlerRegistry`](super::HandlerRegistry)
/// and invoked in registration order. The ID is the handler's identity:
/// registering a second handler with the same ID under the same event is a
/// no-op.
pub trait Handler {
    /// Unique identifier for this handler.
    fn id(&self) -> &str;

    /// Runs the check.
    ///
    /// # Returns
    ///
    /// - `Ok(Continue)`: the event may proceed to the next handler
    /// - `Ok(Abort { reason })`: the event is rejected by policy
    /// - `Err(_)`: the check itself could not be completed
    fn handle(&self, session: &Session) -> Result<HookAction, HookError>;
}

type HandlerFn = dyn Fn(&Session) -> Result<HookAction, HookError>;

/// A handler backed by a closure.
///
/// ```
/// use refgate_runtime::hook::{FnHandler, Handler, HookAction};
///
/// let handler = FnHandler::new("no-delete", |session| {
///     if session.refs().iter().any(|r| r.is_delete()) {
///         Ok(HookAction::abort("deleting references is not allowed"))
///     } else {
///         Ok(HookAction::Continue)
///     }
/// });
/// assert_eq!(handler.id(), "no-delete");
/// ```
pub struct FnHandler {
    id: String,
    f: Box<HandlerFn>,
}

impl FnHandler {
    /// Wraps `f` under `id`.
    pub fn new(
        id: impl Into<String>,
        f: impl Fn(&Session) -> Result<HookAction, HookError> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            f: Box::new(f),
        }
    }
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("id", &self.id).finish()
    }
}

impl Handler for FnHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn handle(&self, session: &Session) -> Result<HookAction, HookError> {
        (self.f)(session)
    }
}
