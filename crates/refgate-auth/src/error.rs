//! Error types for group and access-rule evaluation.

use refgate_types::ErrorCode;
use thiserror::Error;

/// Errors from parsing or querying a group specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupSpecError {
    /// A non-blank line that is not `name = member ...`.
    #[error("line {line}: malformed group definition: '{text}'")]
    Malformed { line: usize, text: String },

    /// A group name defined twice.
    #[error("line {line}: group '@{name}' is already defined")]
    Redefined { line: usize, name: String },

    /// A nested group used before its definition.
    #[error("line {line}: group '@{group}' references undefined group '@{member}'")]
    UndefinedReference {
        line: usize,
        group: String,
        member: String,
    },

    /// Membership queried for a group that does not exist.
    #[error("unknown group '@{0}'")]
    UnknownGroup(String),
}

impl ErrorCode for GroupSpecError {
    fn code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "GROUP_MALFORMED",
            Self::Redefined { .. } => "GROUP_REDEFINED",
            Self::UndefinedReference { .. } => "GROUP_UNDEFINED_REFERENCE",
            Self::UnknownGroup(_) => "GROUP_UNKNOWN",
        }
    }
}

/// A malformed access rule or admin specification.
#[derive(Debug, Clone, Error)]
pub enum AclConfigError {
    /// A rule that does not have the `who what refs` shape.
    #[error("malformed ACL rule '{0}' (expected 'who what refs')")]
    MalformedRule(String),

    /// An operation character outside `CRUD`, or `-` mixed with operations.
    #[error("invalid operation spec '{spec}' (use a subset of CRUD or '-')")]
    InvalidWhat { spec: String },

    /// A `^` or `!` spec that is not a valid regular expression.
    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl ErrorCode for AclConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::MalformedRule(_) => "ACL_MALFORMED_RULE",
            Self::InvalidWhat { .. } => "ACL_INVALID_WHAT",
            Self::InvalidRegex { .. } => "ACL_INVALID_REGEX",
        }
    }
}

/// Errors raised while authorizing one reference update.
#[derive(Debug, Clone, Error)]
pub enum AclError {
    /// The rules themselves are broken.
    #[error(transparent)]
    Config(#[from] AclConfigError),

    /// A `@group` spec could not be resolved.
    #[error(transparent)]
    Group(#[from] GroupSpecError),
}

impl ErrorCode for AclError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Group(e) => e.code(),
        }
    }
}
