//! Configuration errors.

use crate::git::GitError;
use refgate_types::{single_line, ErrorCode};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file or a `file:` value.
    #[error("failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a TOML config file.
    #[error("failed to parse config file '{path}': {}", toml_summary(.source))]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A TOML value with no key/value rendition (array of tables, nested array).
    #[error("unsupported value for '{key}' in '{path}'")]
    UnsupportedValue { path: PathBuf, key: String },

    /// Reading git's own configuration failed.
    #[error("cannot read git configuration: {0}")]
    Git(#[source] GitError),

    /// A `-c` override without `=`.
    #[error("invalid override '{0}' (expected key=value)")]
    InvalidOverride(String),

    /// A value that should be boolean is not.
    #[error("invalid boolean for '{key}': '{value}'")]
    InvalidBool { key: String, value: String },

    /// A value source the engine refuses to evaluate.
    #[error("'{key}': {prefix}-values are not supported")]
    Unsupported { key: String, prefix: String },

    /// An `env:` source naming an unset variable.
    #[error("environment variable '{0}' is not set")]
    EnvUnset(String),

    /// A `cmd:` source with no program.
    #[error("empty command for '{0}'")]
    EmptyCommand(String),

    /// A `cmd:` source that could not run or exited non-zero.
    #[error("command '{command}' failed: {message}")]
    Command { command: String, message: String },

    /// The acting user could not be determined.
    #[error("cannot determine acting user from '{source_desc}'")]
    MissingUser { source_desc: String },
}

impl ConfigError {
    /// Creates a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse TOML error.
    pub fn parse_toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseToml {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid boolean error.
    pub fn invalid_bool(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidBool {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a command failure error.
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// One-line rendition of a TOML parse error: location, then message.
pub(crate) fn toml_summary(err: &toml::de::Error) -> String {
    let message = single_line(err.message());
    if err.span().is_none() {
        return message;
    }
    // With a span, the first rendered line is "TOML parse error at line L, column C".
    match err.to_string().lines().next() {
        Some(location) => format!("{location}: {message}"),
        None => message,
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "CONFIG_READ_FILE",
            Self::ParseToml { .. } => "CONFIG_PARSE_TOML",
            Self::UnsupportedValue { .. } => "CONFIG_UNSUPPORTED_VALUE",
            Self::Git(_) => "CONFIG_GIT",
            Self::InvalidOverride(_) => "CONFIG_INVALID_OVERRIDE",
            Self::InvalidBool { .. } => "CONFIG_INVALID_BOOL",
            Self::Unsupported { .. } => "CONFIG_UNSUPPORTED_SOURCE",
            Self::EnvUnset(_) => "CONFIG_ENV_UNSET",
            Self::EmptyCommand(_) => "CONFIG_EMPTY_COMMAND",
            Self::Command { .. } => "CONFIG_COMMAND",
            Self::MissingUser { .. } => "CONFIG_MISSING_USER",
        }
    }
}
