//! How an event's data reaches an external program.

use refgate_types::{AffectedRef, EventName};

/// Argument and input framing for an external program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookProtocol {
    /// Event arguments on the command line, nothing on stdin.
    Argv,
    /// One `old new ref` line per affected reference on stdin, then EOF.
    StreamedLines,
}

impl HookProtocol {
    /// Returns the protocol git uses for `event`.
    #[must_use]
    pub fn for_event(event: EventName) -> Self {
        if event.streams_refs() {
            Self::StreamedLines
        } else {
            Self::Argv
        }
    }

    /// Returns the bytes to write on stdin, if the protocol uses it.
    #[must_use]
    pub fn stdin_payload(&self, refs: &[AffectedRef]) -> Option<String> {
        match self {
            Self::Argv => None,
            Self::StreamedLines => Some(refs.iter().fold(String::new(), |mut out, r| {
                out.push_str(&r.to_line());
                out.push('\n');
                out
            })),
        }
    }
}
