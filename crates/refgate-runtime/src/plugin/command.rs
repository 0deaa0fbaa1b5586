//! Plugins backed by an external program.

use super::{Plugin, PluginError};
use crate::external::{invoke_argv, ExternalHookError};
use crate::hook::{Handler, HandlerRegistry, HookAction, HookError};
use crate::session::Session;
use refgate_types::EventName;
use std::path::PathBuf;

/// A plugin that runs a program for its events.
///
/// The program receives the event's arguments after its own, and the
/// affected references on stdin for streamed events. A non-zero exit or a
/// signal rejects the event.
#[derive(Debug, Clone)]
pub struct CommandPlugin {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    events: Vec<EventName>,
}

impl CommandPlugin {
    /// Creates a command plugin.
    pub fn new(
        name: impl Into<String>,
        program: impl Into<PathBuf>,
        args: Vec<String>,
        events: Vec<EventName>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            events,
        }
    }

    fn handler_id(&self) -> String {
        format!("command:{}", self.name)
    }
}

impl Plugin for CommandPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn install(&self, registry: &mut HandlerRegistry, session: &Session) -> Result<(), PluginError> {
        let events = if self.events.is_empty() {
            vec![session.event()]
        } else {
            self.events.clone()
        };
        let id = self.handler_id();
        registry.register_each(&events, |_| {
            Box::new(CommandHandler {
                id: id.clone(),
                program: self.program.clone(),
                args: self.args.clone(),
            })
        });
        Ok(())
    }
}

struct CommandHandler {
    id: String,
    program: PathBuf,
    args: Vec<String>,
}

impl Handler for CommandHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn handle(&self, session: &Session) -> Result<HookAction, HookError> {
        match invoke_argv(
            &self.program,
            &self.args,
            session.event(),
            session.args(),
            session.refs(),
        ) {
            Ok(()) => Ok(HookAction::Continue),
            Err(e @ (ExternalHookError::Exit { .. } | ExternalHookError::Signal { .. })) => {
                Ok(HookAction::abort(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
