//! Hook action: return type from handlers.
//!
//! `Default` is intentionally NOT implemented: a handler must say whether
//! the event may proceed.

/// What a handler wants the dispatcher to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// The check passed; run the next handler.
    Continue,

    /// Reject the event. Later handlers and external hooks do not run.
    Abort {
        /// Reason shown to the pushing client.
        reason: String,
    },
}

impl HookAction {
    /// Creates an `Abort` with the given reason.
    pub fn abort(reason: impl Into<String>) -> Self {
        Self::Abort {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_constructor() {
        let abort = HookAction::abort("no");
        assert_ne!(abort, HookAction::Continue);
        assert_eq!(
            abort,
            HookAction::Abort {
                reason: "no".into()
            }
        );
    }
}
