//! Handler registry: per-event handler lists.
//!
//! Owned by the dispatcher for one run and passed explicitly to plugins,
//! so there is no process-wide handler table.

use super::{Handler, HookAction, HookError};
use crate::session::Session;
use refgate_types::EventName;
use std::collections::HashMap;

/// Registry of in-process handlers, indexed by event.
///
/// Within each event, handlers keep registration order. Registering a
/// handler whose ID is already present for that event does nothing.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventName, Vec<Box<dyn Handler>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `event`.
    ///
    /// Returns `false` if a handler with the same ID was already registered
    /// for `event`; the new one is dropped.
    pub fn register(&mut self, event: EventName, handler: Box<dyn Handler>) -> bool {
        let entry = self.handlers.entry(event).or_default();
        if entry.iter().any(|h| h.id() == handler.id()) {
            tracing::debug!(event = %event, handler = handler.id(), "handler already registered");
            return false;
        }
        tracing::debug!(
            event = %event,
            handler = handler.id(),
            ordinal = entry.len(),
            "registered handler"
        );
        entry.push(handler);
        true
    }

    /// Registers one handler per event in `events`, built by `make`.
    ///
    /// Returns how many were new.
    pub fn register_each<F>(&mut self, events: &[EventName], mut make: F) -> usize
    where
        F: FnMut(EventName) -> Box<dyn Handler>,
    {
        events
            .iter()
            .filter(|&&event| self.register(event, make(event)))
            .count()
    }

    /// Moves every handler of `other` to the end of this registry.
    ///
    /// Per-event order is kept and IDs already present are skipped, as with
    /// [`register`](Self::register). Returns how many were new.
    pub fn append(&mut self, other: HandlerRegistry) -> usize {
        let mut added = 0;
        for (event, handlers) in other.handlers {
            for handler in handlers {
                if self.register(event, handler) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Returns the handlers for `event`, in registration order.
    pub fn handlers_for(&self, event: EventName) -> impl Iterator<Item = &dyn Handler> + '_ {
        self.handlers
            .get(&event)
            .into_iter()
            .flatten()
            .map(|h| &**h)
    }

    /// Returns the IDs registered for `event`, in registration order.
    #[must_use]
    pub fn ids_for(&self, event: EventName) -> Vec<&str> {
        self.handlers_for(event).map(|h| h.id()).collect()
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every handler for the session's event.
    ///
    /// Chain semantics: the first `Abort` or error stops the chain; later
    /// handlers do not run.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Rejected`] for an `Abort`, or the handler's own
    /// error.
    pub fn dispatch(&self, session: &Session) -> Result<usize, HookError> {
        let event = session.event();
        let mut ran = 0;
        for handler in self.handlers_for(event) {
            tracing::debug!(event = %event, handler = handler.id(), "running handler");
            match handler.handle(session)? {
                HookAction::Continue => ran += 1,
                HookAction::Abort { reason } => {
                    tracing::warn!(event = %event, handler = handler.id(), %reason, "handler rejected event");
                    return Err(HookError::Rejected {
                        handler: handler.id().to_string(),
                        reason,
                    });
                }
            }
        }
        Ok(ran)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (event, handlers) in &self.handlers {
            let ids: Vec<&str> = handlers.iter().map(|h| h.id()).collect();
            map.entry(event, &ids);
        }
        map.finish()
    }
}
