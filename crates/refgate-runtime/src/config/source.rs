//! Typed configuration values.
//!
//! Some options hold either their value or a pointer to where the value
//! lives:
//!
//! | Prefix | Variant | Resolved by |
//! |--------|---------|-------------|
//! | (none) | [`ValueSource::Literal`] | the text itself |
//! | `file:` | [`ValueSource::FromFile`] | reading the file (relative to the git dir) |
//! | `env:` | [`ValueSource::FromEnv`] | reading the environment variable |
//! | `cmd:` | [`ValueSource::FromExternalCommand`] | running the command, trimmed stdout |
//!
//! `eval:` is rejected: no configuration value is ever evaluated as code.

use super::ConfigError;
use refgate_types::single_line;
use std::path::{Path, PathBuf};
use std::process::Command;

const REJECTED_PREFIXES: &[&str] = &["eval"];

/// Where a configuration value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// The value itself.
    Literal(String),
    /// Contents of a file.
    FromFile(PathBuf),
    /// Value of an environment variable.
    FromEnv(String),
    /// Standard output of a command (argv, no shell).
    FromExternalCommand(Vec<String>),
}

impl ValueSource {
    /// Parses the value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unsupported`] for `eval:` values and
    /// [`ConfigError::EmptyCommand`] for a bare `cmd:`.
    pub fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        if let Some(path) = value.strip_prefix("file:") {
            return Ok(Self::FromFile(PathBuf::from(path.trim())));
        }
        if let Some(var) = value.strip_prefix("env:") {
            return Ok(Self::FromEnv(var.trim().to_string()));
        }
        if let Some(cmd) = value.strip_prefix("cmd:") {
            let argv: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
            if argv.is_empty() {
                return Err(ConfigError::EmptyCommand(key.to_string()));
            }
            return Ok(Self::FromExternalCommand(argv));
        }
        for prefix in REJECTED_PREFIXES {
            if value
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with(':'))
            {
                return Err(ConfigError::Unsupported {
                    key: key.to_string(),
                    prefix: (*prefix).to_string(),
                });
            }
        }
        Ok(Self::Literal(value.to_string()))
    }

    /// Resolves the value. Relative file paths are joined onto `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, the variable is
    /// unset, or the command fails.
    pub fn resolve(&self, base: &Path) -> Result<String, ConfigError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::FromFile(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    base.join(path)
                };
                std::fs::read_to_string(&path).map_err(|e| ConfigError::read_file(&path, e))
            }
            Self::FromEnv(var) => {
                std::env::var(var).map_err(|_| ConfigError::EnvUnset(var.clone()))
            }
            Self::FromExternalCommand(argv) => run_command(argv, base),
        }
    }

    /// Short description for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Literal(_) => "literal value".to_string(),
            Self::FromFile(path) => format!("file:{}", path.display()),
            Self::FromEnv(var) => format!("env:{var}"),
            Self::FromExternalCommand(argv) => format!("cmd:{}", argv.join(" ")),
        }
    }
}

fn run_command(argv: &[String], cwd: &Path) -> Result<String, ConfigError> {
    let display = argv.join(" ");
    let Some((program, args)) = argv.split_first() else {
        return Err(ConfigError::EmptyCommand(display));
    };

    let mut cmd = Command::new(program);
    cmd.args(args);
    if cwd.is_dir() {
        cmd.current_dir(cwd);
    }
    let output = cmd
        .output()
        .map_err(|e| ConfigError::command(&display, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConfigError::command(
            &display,
            format!("{}: {}", output.status, single_line(&stderr)),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
