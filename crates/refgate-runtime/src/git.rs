//! Thin bridge to the `git` executable.
//!
//! Only three questions are ever asked of the repository: where it is,
//! what its configuration says, and whether one commit is an ancestor of
//! another.

use refgate_auth::Ancestry;
use refgate_types::{single_line, ErrorCode};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;

/// Errors from running git.
#[derive(Debug, Error)]
pub enum GitError {
    /// `git` could not be started.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// `git` ran but reported failure.
    #[error("'{command}' failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    /// No repository could be located.
    #[error("not a git repository: {0}")]
    NotARepository(String),
}

impl ErrorCode for GitError {
    fn code(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "GIT_SPAWN",
            Self::Failed { .. } => "GIT_FAILED",
            Self::NotARepository(_) => "GIT_NOT_A_REPOSITORY",
        }
    }
}

/// A repository, addressed by its git directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepository {
    git_dir: PathBuf,
}

impl GitRepository {
    /// Wraps a known git directory without checking it.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    /// Locates the repository the way git does (`GIT_DIR`, then the
    /// current directory and its parents).
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotARepository`] outside a repository.
    pub fn discover() -> Result<Self, GitError> {
        let mut cmd = Command::new("git");
        cmd.args(["rev-parse", "--absolute-git-dir"]);
        match run(&mut cmd, "git rev-parse --absolute-git-dir") {
            Ok(output) => {
                let dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
                tracing::debug!(git_dir = %dir, "discovered repository");
                Ok(Self::new(dir))
            }
            Err(GitError::Failed { stderr, .. }) => Err(GitError::NotARepository(stderr)),
            Err(e) => Err(e),
        }
    }

    /// Returns the git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("--git-dir").arg(&self.git_dir);
        cmd
    }

    /// Lists the merged git configuration as `(key, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`GitError`] if `git config` cannot run.
    pub fn config_list(&self) -> Result<Vec<(String, String)>, GitError> {
        let label = "git config --null --list";
        let output = self
            .git()
            .args(["config", "--null", "--list"])
            .output()
            .map_err(|source| GitError::Spawn {
                command: label.to_string(),
                source,
            })?;
        match output.status.code() {
            Some(0) => Ok(parse_config_list(&output.stdout)),
            // Nothing configured at all.
            Some(1) if output.stdout.is_empty() && output.stderr.is_empty() => Ok(Vec::new()),
            _ => Err(failed(label.to_string(), &output)),
        }
    }

    /// Returns `true` if `ancestor` is reachable from `descendant`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError`] if git fails for any reason other than the
    /// answer being "no" (for example an unknown object).
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, GitError> {
        let label = format!("git merge-base --is-ancestor {ancestor} {descendant}");
        let output = self
            .git()
            .args(["merge-base", "--is-ancestor", ancestor, descendant])
            .output()
            .map_err(|source| GitError::Spawn {
                command: label.clone(),
                source,
            })?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(failed(label, &output)),
        }
    }
}

impl Ancestry for GitRepository {
    type Error = GitError;

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, GitError> {
        GitRepository::is_ancestor(self, ancestor, descendant)
    }
}

fn run(cmd: &mut Command, label: &str) -> Result<Output, GitError> {
    let output = cmd.output().map_err(|source| GitError::Spawn {
        command: label.to_string(),
        source,
    })?;
    if output.status.success() {
        Ok(output)
    } else {
        Err(failed(label.to_string(), &output))
    }
}

fn failed(command: String, output: &Output) -> GitError {
    GitError::Failed {
        command,
        status: output.status.to_string(),
        stderr: single_line(&String::from_utf8_lossy(&output.stderr)),
    }
}

/// Parses `git config --null --list` output.
///
/// Each record is `key\nvalue\0`; a key with no value at all (`key\0`) is an
/// implicit `true`.
pub(crate) fn parse_config_list(raw: &[u8]) -> Vec<(String, String)> {
    String::from_utf8_lossy(raw)
        .split('\0')
        .filter(|record| !record.is_empty())
        .map(|record| match record.split_once('\n') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (record.to_string(), "true".to_string()),
        })
        .collect()
}
