//! External hook errors.

use refgate_types::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// An external hook that did not succeed.
///
/// Every variant names the executable.
#[derive(Debug, Error)]
pub enum ExternalHookError {
    /// The executable could not be started.
    #[error("cannot run '{path}': {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing references to the hook or waiting for it failed.
    #[error("i/o error talking to '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The hook exited with a non-zero status.
    #[error("'{path}' exited with code {code}")]
    Exit { path: PathBuf, code: i32 },

    /// The hook was killed by a signal.
    #[error("'{path}' was killed by signal {signal}")]
    Signal { path: PathBuf, signal: i32 },

    /// A hook directory could not be listed.
    #[error("cannot list hook directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExternalHookError {
    /// Returns the executable or directory involved.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Spawn { path, .. }
            | Self::Io { path, .. }
            | Self::Exit { path, .. }
            | Self::Signal { path, .. }
            | Self::ReadDir { path, .. } => path,
        }
    }
}

impl ErrorCode for ExternalHookError {
    fn code(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "EXTERNAL_SPAWN",
            Self::Io { .. } => "EXTERNAL_IO",
            Self::Exit { .. } => "EXTERNAL_EXIT",
            Self::Signal { .. } => "EXTERNAL_SIGNAL",
            Self::ReadDir { .. } => "EXTERNAL_READ_DIR",
        }
    }
}
