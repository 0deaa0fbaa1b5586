//! One event, start to finish.
//!
//! ```text
//! Invocation (args / stdin normalized)
//!     │
//!     ▼
//! 1. plugins   <ns>.<event> names, resolved + installed once each
//!     │
//!     ▼
//! 2. handlers  HandlerRegistry, registration order
//!     │
//!     ▼
//! 3. externals hooks.d/<event>/* and <ns>.hooks roots (if <ns>.externals)
//! ```
//!
//! The first failure in any phase ends the run; nothing after it executes.

use crate::config::ConfigError;
use crate::external::{ExternalHookError, ExternalHookRunner};
use crate::git::GitError;
use crate::hook::{HandlerRegistry, HookError};
use crate::invocation::InputError;
use crate::plugin::{PluginError, PluginResolver};
use crate::session::{Session, SessionError};
use refgate_auth::{AclConfigError, GroupSpecError};
use refgate_types::{ErrorCode, UnknownEvent};
use thiserror::Error;

/// Why an event was rejected.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Groups(#[from] GroupSpecError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Acl(#[from] AclConfigError),

    /// A handler rejected the event, or could not run its check.
    #[error("{handler}: {reason}")]
    Policy { handler: String, reason: String },

    #[error(transparent)]
    External(#[from] ExternalHookError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Event(#[from] UnknownEvent),
}

impl DispatchError {
    /// Short name of the failing component, for the diagnostic prefix.
    #[must_use]
    pub fn component(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Groups(_) => "groups",
            Self::Plugin(_) => "plugin",
            Self::Acl(_) => "acl",
            Self::Policy { .. } => "policy",
            Self::External(_) => "external",
            Self::Git(_) => "git",
            Self::Input(_) | Self::Event(_) => "input",
        }
    }
}

impl From<HookError> for DispatchError {
    fn from(err: HookError) -> Self {
        match err {
            HookError::Rejected { handler, reason } => Self::Policy { handler, reason },
            HookError::Failed { handler, message } => Self::Policy {
                handler,
                reason: message,
            },
            HookError::Config(e) => Self::Config(e),
            HookError::Groups(e) => Self::Groups(e),
            HookError::Acl(e) => Self::Acl(e),
            HookError::Git(e) => Self::Git(e),
            HookError::External(e) => Self::External(e),
        }
    }
}

impl From<SessionError> for DispatchError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Config(e) => Self::Config(e),
            SessionError::Groups(e) => Self::Groups(e),
        }
    }
}

impl ErrorCode for DispatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Groups(e) => e.code(),
            Self::Plugin(e) => e.code(),
            Self::Acl(e) => e.code(),
            Self::Policy { .. } => "POLICY_VIOLATION",
            Self::External(e) => e.code(),
            Self::Git(e) => e.code(),
            Self::Input(e) => e.code(),
            Self::Event(e) => e.code(),
        }
    }
}

/// What a successful run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Plugins installed by this run.
    pub plugins: usize,
    /// Handlers that ran and passed.
    pub handlers: usize,
    /// External hooks that ran and passed.
    pub externals: usize,
}

/// Runs the phases of one event.
///
/// Owns the handler registry for the run. Handlers registered through
/// [`registry_mut`](Self::registry_mut) before [`run`](Self::run) run after
/// those installed by plugins.
#[derive(Debug)]
pub struct Dispatcher {
    registry: HandlerRegistry,
    resolver: PluginResolver,
}

impl Dispatcher {
    /// Creates a dispatcher resolving plugins the session's way.
    #[must_use]
    pub fn new(session: &Session) -> Self {
        Self::with_resolver(PluginResolver::from_session(session))
    }

    /// Creates a dispatcher with a custom resolver.
    #[must_use]
    pub fn with_resolver(resolver: PluginResolver) -> Self {
        Self {
            registry: HandlerRegistry::new(),
            resolver,
        }
    }

    /// The handler registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// The handler registry, for registering handlers before the run.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// The plugin resolver.
    #[must_use]
    pub fn resolver(&self) -> &PluginResolver {
        &self.resolver
    }

    fn load_plugins(&mut self, names: &[String], session: &Session) -> Result<usize, PluginError> {
        let mut loaded = 0;
        for name in names {
            if self.resolver.load(name, &mut self.registry, session)? {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Runs the session's event through every phase.
    ///
    /// # Errors
    ///
    /// Returns the first [`DispatchError`]; later phases do not run.
    pub fn run(&mut self, session: &Session) -> Result<DispatchReport, DispatchError> {
        let event = session.event();
        let mut report = DispatchReport::default();

        // Phase 1: plugins
        let names: Vec<String> = session
            .config()
            .get_words(&session.key(event.as_str()))
            .into_iter()
            .map(str::to_string)
            .collect();
        let preregistered = std::mem::take(&mut self.registry);
        let loaded = self.load_plugins(&names, session);
        self.registry.append(preregistered);
        report.plugins = loaded?;
        tracing::info!(event = %event, plugins = report.plugins, "plugin phase complete");

        // Phase 2: handlers
        report.handlers = self.registry.dispatch(session)?;
        tracing::info!(event = %event, handlers = report.handlers, "handler phase complete");

        // Phase 3: external hooks
        if session.externals_enabled()? {
            report.externals = ExternalHookRunner::from_session(session)
                .run(session)
                .inspect_err(|e| tracing::warn!(event = %event, error = %e, "external hook failed"))?;
            tracing::info!(event = %event, externals = report.externals, "external phase complete");
        } else {
            tracing::debug!(event = %event, "external hooks disabled");
        }

        Ok(report)
    }
}
