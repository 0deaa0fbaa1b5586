//! Error types for handlers.

use crate::config::ConfigError;
use crate::external::ExternalHookError;
use crate::git::GitError;
use crate::session::SessionError;
use refgate_auth::{AclConfigError, AclError, GroupSpecError};
use refgate_types::ErrorCode;
use thiserror::Error;

/// Errors raised while running handlers.
#[derive(Debug, Error)]
pub enum HookError {
    /// A handler rejected the event.
    #[error("{reason}")]
    Rejected {
        /// ID of the rejecting handler.
        handler: String,
        /// Reason shown to the client.
        reason: String,
    },

    /// A handler could not complete its check.
    #[error("handler failed [{handler}]: {message}")]
    Failed {
        /// ID of the failing handler.
        handler: String,
        /// Error message.
        message: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Groups(#[from] GroupSpecError),

    #[error(transparent)]
    Acl(#[from] AclConfigError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    External(#[from] ExternalHookError),
}

impl From<AclError> for HookError {
    fn from(err: AclError) -> Self {
        match err {
            AclError::Config(e) => Self::Acl(e),
            AclError::Group(e) => Self::Groups(e),
        }
    }
}

impl From<SessionError> for HookError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Config(e) => Self::Config(e),
            SessionError::Groups(e) => Self::Groups(e),
        }
    }
}

impl ErrorCode for HookError {
    fn code(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "HOOK_REJECTED",
            Self::Failed { .. } => "HOOK_FAILED",
            Self::Config(e) => e.code(),
            Self::Groups(e) => e.code(),
            Self::Acl(e) => e.code(),
            Self::Git(e) => e.code(),
            Self::External(e) => e.code(),
        }
    }
}
