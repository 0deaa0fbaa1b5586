//! Per-run state shared by every phase.

use crate::config::{ConfigError, ConfigStore, ValueSource, DEFAULT_NAMESPACE};
use crate::git::GitRepository;
use crate::invocation::Invocation;
use refgate_auth::{AclConfigError, GroupMap, GroupSpecError, WhoSpec};
use refgate_types::{AffectedRef, ErrorCode, EventName};
use std::cell::OnceCell;
use std::path::Path;
use thiserror::Error;

/// Environment variable holding the acting user when `userenv` is unset.
pub const DEFAULT_USER_ENV: &str = "USER";

/// Errors from lazily-computed session state.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A configuration value could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Group definitions failed to parse.
    #[error(transparent)]
    Groups(#[from] GroupSpecError),
}

impl ErrorCode for SessionError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Groups(e) => e.code(),
        }
    }
}

/// State for one hook run.
///
/// Built once by the caller, borrowed by plugins, handlers and the external
/// runner, dropped at process exit. Identity and groups are computed on
/// first use and cached; a run that never needs them never fails on them.
///
/// # Why No Default?
///
/// A session always belongs to a repository and an event. There is no
/// sensible default for either.
#[derive(Debug)]
pub struct Session {
    config: ConfigStore,
    namespace: String,
    repo: GitRepository,
    invocation: Invocation,
    user: OnceCell<String>,
    groups: OnceCell<GroupMap>,
}

impl Session {
    /// Creates a session in the default `githooks` namespace.
    #[must_use]
    pub fn new(config: ConfigStore, repo: GitRepository, invocation: Invocation) -> Self {
        Self {
            config,
            namespace: DEFAULT_NAMESPACE.to_string(),
            repo,
            invocation,
            user: OnceCell::new(),
            groups: OnceCell::new(),
        }
    }

    /// Uses `namespace` as the configuration section.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Fixes the acting user instead of resolving it from configuration.
    #[must_use]
    pub fn with_user(self, user: impl Into<String>) -> Self {
        // A fresh session has an empty cell, so this always stores.
        let _ = self.user.set(user.into());
        self
    }

    /// Returns `<namespace>.<name>`.
    #[must_use]
    pub fn key(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
    }

    /// The configuration store.
    #[must_use]
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// The configuration namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The repository.
    #[must_use]
    pub fn repo(&self) -> &GitRepository {
        &self.repo
    }

    /// The repository's git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.repo.git_dir()
    }

    /// The normalized invocation.
    #[must_use]
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// The event that fired.
    #[must_use]
    pub fn event(&self) -> EventName {
        self.invocation.event()
    }

    /// The event's positional arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        self.invocation.args()
    }

    /// The affected references.
    #[must_use]
    pub fn refs(&self) -> &[AffectedRef] {
        self.invocation.refs()
    }

    /// Returns the acting user.
    ///
    /// `<ns>.userenv` names an environment variable (default `USER`), or is
    /// a `file:` / `env:` / `cmd:` value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingUser`] if the identity is unset or
    /// empty, or another [`ConfigError`] if the source cannot be resolved.
    pub fn user(&self) -> Result<&str, ConfigError> {
        if let Some(user) = self.user.get() {
            return Ok(user);
        }

        let key = self.key("userenv");
        let raw = self.config.get(&key).unwrap_or(DEFAULT_USER_ENV);
        let source = match ValueSource::parse(&key, raw)? {
            ValueSource::Literal(var) => ValueSource::FromEnv(var),
            other => other,
        };
        let missing = || ConfigError::MissingUser {
            source_desc: source.describe(),
        };

        let user = match source.resolve(self.git_dir()) {
            Ok(value) => value.trim().to_string(),
            Err(ConfigError::EnvUnset(_)) => return Err(missing()),
            Err(e) => return Err(e),
        };
        if user.is_empty() {
            return Err(missing());
        }

        tracing::debug!(user = %user, source = %source.describe(), "resolved acting user");
        Ok(self.user.get_or_init(|| user))
    }

    /// Returns the group definitions from every `<ns>.groups` value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if a value cannot be resolved or the
    /// combined text does not parse.
    pub fn groups(&self) -> Result<&GroupMap, SessionError> {
        if let Some(groups) = self.groups.get() {
            return Ok(groups);
        }

        let key = self.key("groups");
        let mut text = String::new();
        for raw in self.config.get_all(&key) {
            let chunk = ValueSource::parse(&key, raw)?.resolve(self.git_dir())?;
            text.push_str(&chunk);
            if !chunk.ends_with('\n') {
                text.push('\n');
            }
        }

        let groups = GroupMap::parse(&text)?;
        tracing::debug!(count = groups.len(), "loaded group definitions");
        Ok(self.groups.get_or_init(|| groups))
    }

    /// Returns the `<ns>.admin` who-specs.
    ///
    /// # Errors
    ///
    /// Returns [`AclConfigError`] for an invalid regex spec.
    pub fn admins(&self) -> Result<Vec<WhoSpec>, AclConfigError> {
        self.config
            .get_all(&self.key("admin"))
            .into_iter()
            .map(WhoSpec::parse)
            .collect()
    }

    /// Returns whether external hooks run (`<ns>.externals`, default true).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBool`] for a non-boolean value.
    pub fn externals_enabled(&self) -> Result<bool, ConfigError> {
        self.config.get_bool(&self.key("externals"), true)
    }
}
