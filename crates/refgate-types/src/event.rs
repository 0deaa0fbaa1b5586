//! Lifecycle events.
//!
//! Every point at which git runs a hook. The event name is the hook's file
//! name under `.git/hooks/`, so it doubles as the dispatch key and as the
//! subdirectory name for external hooks.

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An event name that is not one of the supported lifecycle points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event: {0}")]
pub struct UnknownEvent(pub String);

impl ErrorCode for UnknownEvent {
    fn code(&self) -> &'static str {
        "EVENT_UNKNOWN"
    }
}

/// How an event delivers the references it affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSource {
    /// The event carries no reference updates.
    None,
    /// `(ref, old, new)` as positional arguments.
    Args,
    /// `old new ref` lines on standard input.
    Stdin,
}

/// All lifecycle points where hooks can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventName {
    // ── Patch application ────────────────────────────────────
    /// `git am`: check the proposed commit message.
    ApplypatchMsg,
    /// `git am`: before the commit is made.
    PreApplypatch,
    /// `git am`: after the commit is made.
    PostApplypatch,

    // ── Commit ───────────────────────────────────────────────
    /// Before the commit message editor is shown.
    PreCommit,
    /// Before the editor is started, with the default message.
    PrepareCommitMsg,
    /// After the message is edited.
    CommitMsg,
    /// After the commit is recorded.
    PostCommit,

    // ── Working tree ─────────────────────────────────────────
    /// Before a rebase starts.
    PreRebase,
    /// After `git checkout` / `git switch`.
    PostCheckout,
    /// After a successful merge.
    PostMerge,

    // ── Server side ──────────────────────────────────────────
    /// Once per push, before any reference is updated.
    PreReceive,
    /// Once per reference, before it is updated.
    Update,
    /// Once per push, after all references are updated.
    PostReceive,
    /// After all references are updated, with their names.
    PostUpdate,

    // ── Maintenance ──────────────────────────────────────────
    /// Before `git gc --auto`.
    PreAutoGc,
    /// After `git commit --amend` / `git rebase`.
    PostRewrite,
}

impl EventName {
    /// Every supported event, in the order git documents them.
    pub const ALL: [EventName; 16] = [
        Self::ApplypatchMsg,
        Self::PreApplypatch,
        Self::PostApplypatch,
        Self::PreCommit,
        Self::PrepareCommitMsg,
        Self::CommitMsg,
        Self::PostCommit,
        Self::PreRebase,
        Self::PostCheckout,
        Self::PostMerge,
        Self::PreReceive,
        Self::Update,
        Self::PostReceive,
        Self::PostUpdate,
        Self::PreAutoGc,
        Self::PostRewrite,
    ];

    /// Returns the canonical hook file name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApplypatchMsg => "applypatch-msg",
            Self::PreApplypatch => "pre-applypatch",
            Self::PostApplypatch => "post-applypatch",
            Self::PreCommit => "pre-commit",
            Self::PrepareCommitMsg => "prepare-commit-msg",
            Self::CommitMsg => "commit-msg",
            Self::PostCommit => "post-commit",
            Self::PreRebase => "pre-rebase",
            Self::PostCheckout => "post-checkout",
            Self::PostMerge => "post-merge",
            Self::PreReceive => "pre-receive",
            Self::Update => "update",
            Self::PostReceive => "post-receive",
            Self::PostUpdate => "post-update",
            Self::PreAutoGc => "pre-auto-gc",
            Self::PostRewrite => "post-rewrite",
        }
    }

    /// Returns where this event's affected references come from.
    #[must_use]
    pub fn ref_source(&self) -> RefSource {
        match self {
            Self::Update => RefSource::Args,
            Self::PreReceive | Self::PostReceive => RefSource::Stdin,
            _ => RefSource::None,
        }
    }

    /// Returns `true` if the event reads its references from standard input.
    #[must_use]
    pub fn streams_refs(&self) -> bool {
        self.ref_source() == RefSource::Stdin
    }
}

impl FromStr for EventName {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
