//! Reference-update classification.

use refgate_types::AffectedRef;
use std::fmt;

/// What a reference update does, in the alphabet access rules grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `C`: the reference did not exist.
    Create,
    /// `R`: history is rewritten, or the reference is not a branch.
    Rewrite,
    /// `U`: a fast-forward of a branch.
    Update,
    /// `D`: the reference is removed.
    Delete,
}

impl Operation {
    /// Returns the rule letter for this operation.
    #[must_use]
    pub fn as_char(&self) -> char {
        match self {
            Self::Create => 'C',
            Self::Rewrite => 'R',
            Self::Update => 'U',
            Self::Delete => 'D',
        }
    }

    /// Parses a rule letter.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'C' => Some(Self::Create),
            'R' => Some(Self::Rewrite),
            'U' => Some(Self::Update),
            'D' => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Answers commit ancestry questions.
///
/// The runtime implements this on top of `git merge-base --is-ancestor`;
/// tests use a fixed table.
pub trait Ancestry {
    /// Error raised when the repository cannot answer.
    type Error;

    /// Returns `true` if `ancestor` is reachable from `descendant`.
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, Self::Error>;
}

/// Classifies one reference update.
///
/// Creation and deletion are decided from the zero sentinel alone. Anything
/// outside `refs/heads/` counts as a rewrite. For branches, one ancestry
/// query separates fast-forwards from history rewrites.
///
/// # Errors
///
/// Propagates the ancestry query's error.
pub fn classify<A>(update: &AffectedRef, ancestry: &A) -> Result<Operation, A::Error>
where
    A: Ancestry + ?Sized,
{
    if update.is_create() {
        return Ok(Operation::Create);
    }
    if update.is_delete() {
        return Ok(Operation::Delete);
    }
    if !update.is_branch() {
        return Ok(Operation::Rewrite);
    }
    if ancestry.is_ancestor(update.old.as_str(), update.new.as_str())? {
        Ok(Operation::Update)
    } else {
        Ok(Operation::Rewrite)
    }
}
