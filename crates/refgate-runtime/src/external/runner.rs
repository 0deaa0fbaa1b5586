//! Running external hook programs.

use super::{ExternalHookError, HookProtocol};
use crate::session::Session;
use refgate_types::{AffectedRef, EventName};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Default hook root, relative to the git directory.
pub const DEFAULT_HOOKS_DIR: &str = "hooks.d";

/// Runs `executable` for one event.
///
/// The program sees the event name as `argv[0]` (on unix) and `args` as its
/// arguments. For streamed events the affected references are written to
/// its stdin, which is then closed.
///
/// # Errors
///
/// Returns [`ExternalHookError`] on spawn failure, a non-zero exit, or
/// signal termination.
pub fn invoke(
    executable: &Path,
    event: EventName,
    args: &[String],
    refs: &[AffectedRef],
) -> Result<(), ExternalHookError> {
    let mut cmd = Command::new(executable);
    cmd.args(args);
    set_arg0(&mut cmd, event);
    run(cmd, executable, HookProtocol::for_event(event), refs)
}

/// Runs a configured command line for one event.
///
/// `argv` comes first, followed by the event arguments.
///
/// # Errors
///
/// Same as [`invoke`].
pub fn invoke_argv(
    program: &Path,
    leading: &[String],
    event: EventName,
    args: &[String],
    refs: &[AffectedRef],
) -> Result<(), ExternalHookError> {
    let mut cmd = Command::new(program);
    cmd.args(leading).args(args);
    run(cmd, program, HookProtocol::for_event(event), refs)
}

#[cfg(unix)]
fn set_arg0(cmd: &mut Command, event: EventName) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(event.as_str());
}

#[cfg(not(unix))]
fn set_arg0(_cmd: &mut Command, _event: EventName) {}

fn run(
    mut cmd: Command,
    path: &Path,
    protocol: HookProtocol,
    refs: &[AffectedRef],
) -> Result<(), ExternalHookError> {
    let payload = protocol.stdin_payload(refs);
    cmd.stdin(if payload.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    tracing::debug!(path = %path.display(), ?protocol, "spawning external hook");
    let mut child = cmd.spawn().map_err(|source| ExternalHookError::Spawn {
        path: path.to_path_buf(),
        source,
    })?;

    if let (Some(payload), Some(mut stdin)) = (payload, child.stdin.take()) {
        match stdin.write_all(payload.as_bytes()) {
            Ok(()) => {}
            // The hook exited without reading everything; its exit status decides.
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Err(source) => {
                let _ = child.wait();
                return Err(ExternalHookError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
        // stdin dropped here: EOF for the child.
    }

    let status = child.wait().map_err(|source| ExternalHookError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    check_status(path, status)
}

fn check_status(path: &Path, status: ExitStatus) -> Result<(), ExternalHookError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(ExternalHookError::Exit {
            path: path.to_path_buf(),
            code,
        }),
        None => Err(ExternalHookError::Signal {
            path: path.to_path_buf(),
            signal: signal_of(status),
        }),
    }
}

#[cfg(unix)]
fn signal_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(-1)
}

#[cfg(not(unix))]
fn signal_of(_status: ExitStatus) -> i32 {
    -1
}

/// Finds and runs the executables under one or more hook roots.
///
/// Each root holds one subdirectory per event; every executable regular
/// file directly inside it runs, in file-name order.
#[derive(Debug, Clone, Default)]
pub struct ExternalHookRunner {
    roots: Vec<PathBuf>,
}

impl ExternalHookRunner {
    /// Creates a runner with no roots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runner over `<git_dir>/hooks.d` and every `<ns>.hooks`
    /// directory, in that order. Relative paths are taken from the git dir.
    pub fn from_session(session: &Session) -> Self {
        let git_dir = session.git_dir();
        let configured = session
            .config()
            .get_all(&session.key("hooks"))
            .into_iter()
            .map(|dir| git_dir.join(dir));
        Self {
            roots: std::iter::once(git_dir.join(DEFAULT_HOOKS_DIR))
                .chain(configured)
                .collect(),
        }
    }

    /// Adds a root after the existing ones.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// The hook roots, in search order.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Lists the executables for `event` across all roots.
    ///
    /// # Errors
    ///
    /// Returns [`ExternalHookError::ReadDir`] if an existing event
    /// directory cannot be listed.
    pub fn discover(&self, event: EventName) -> Result<Vec<PathBuf>, ExternalHookError> {
        let mut found = Vec::new();
        for root in &self.roots {
            found.extend(executables_in(&root.join(event.as_str()))?);
        }
        Ok(found)
    }

    /// Runs every hook for the session's event, stopping at the first
    /// failure. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExternalHookError`].
    pub fn run(&self, session: &Session) -> Result<usize, ExternalHookError> {
        let event = session.event();
        let hooks = self.discover(event)?;
        for hook in &hooks {
            invoke(hook, event, session.args(), session.refs())?;
            tracing::debug!(path = %hook.display(), "external hook passed");
        }
        Ok(hooks.len())
    }
}

fn executables_in(dir: &Path) -> Result<Vec<PathBuf>, ExternalHookError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let read_dir = |source| ExternalHookError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir)? {
        let path = entry.map_err(read_dir)?.path();
        if is_executable(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
