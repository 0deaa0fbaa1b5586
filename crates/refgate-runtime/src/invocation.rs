//! What fired: the event, its arguments and the references it touches.

use refgate_types::{AffectedRef, ErrorCode, EventName, RefParseError, RefSource};
use std::io::BufRead;
use thiserror::Error;

/// Errors normalizing an event's input.
#[derive(Debug, Error)]
pub enum InputError {
    /// `update` called without exactly `ref old new`.
    #[error("{event} expects 3 arguments (ref old new), got {got}")]
    Arity { event: EventName, got: usize },

    /// Bad `update` arguments.
    #[error("invalid {event} arguments: {source}")]
    Args {
        event: EventName,
        #[source]
        source: RefParseError,
    },

    /// A bad line on standard input.
    #[error("stdin line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: RefParseError,
    },

    /// Standard input could not be read.
    #[error("failed to read stdin: {0}")]
    Read(#[from] std::io::Error),
}

impl ErrorCode for InputError {
    fn code(&self) -> &'static str {
        match self {
            Self::Arity { .. } => "INPUT_ARITY",
            Self::Args { .. } => "INPUT_ARGS",
            Self::Line { .. } => "INPUT_LINE",
            Self::Read(_) => "INPUT_READ",
        }
    }
}

/// One event invocation, normalized.
///
/// The affected-reference set is built once and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    event: EventName,
    args: Vec<String>,
    refs: Vec<AffectedRef>,
}

impl Invocation {
    /// Builds an invocation, reading `input` only for events that stream
    /// references on standard input.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] for a wrong `update` argument count, an
    /// invalid object id, or a malformed input line.
    pub fn read<R: BufRead>(
        event: EventName,
        args: Vec<String>,
        input: R,
    ) -> Result<Self, InputError> {
        let refs = match event.ref_source() {
            RefSource::None => Vec::new(),
            RefSource::Args => {
                let [name, old, new] = args.as_slice() else {
                    return Err(InputError::Arity {
                        event,
                        got: args.len(),
                    });
                };
                let r = AffectedRef::from_args(name, old, new)
                    .map_err(|source| InputError::Args { event, source })?;
                vec![r]
            }
            RefSource::Stdin => read_lines(input)?,
        };
        tracing::debug!(event = %event, args = args.len(), refs = refs.len(), "normalized input");
        Ok(Self { event, args, refs })
    }

    /// Builds an invocation from already-parsed references.
    #[must_use]
    pub fn with_refs(event: EventName, args: Vec<String>, refs: Vec<AffectedRef>) -> Self {
        Self { event, args, refs }
    }

    /// The event that fired.
    #[must_use]
    pub fn event(&self) -> EventName {
        self.event
    }

    /// Positional arguments, as received.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Affected references, in input order.
    #[must_use]
    pub fn refs(&self) -> &[AffectedRef] {
        &self.refs
    }
}

fn read_lines<R: BufRead>(input: R) -> Result<Vec<AffectedRef>, InputError> {
    let mut refs = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let r = AffectedRef::parse_line(&line).map_err(|source| InputError::Line {
            line: index + 1,
            source,
        })?;
        refs.push(r);
    }
    Ok(refs)
}
