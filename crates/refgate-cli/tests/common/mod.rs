//! Shared E2E helpers for `refgate` binary tests.

#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;

/// Default timeout for a single dispatch.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

pub const ZERO: &str = "0000000000000000000000000000000000000000";
pub const A: &str = "1111111111111111111111111111111111111111";

/// Returns `true` if a `git` binary is on PATH.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A bare repository plus an isolated HOME.
pub struct Fixture {
    pub home: TempDir,
    pub repo: TempDir,
}

impl Fixture {
    /// Creates the fixture, or `None` when git is unavailable.
    pub fn new() -> Option<Self> {
        if !git_available() {
            return None;
        }
        let home = TempDir::new().expect("create home dir");
        let repo = TempDir::new().expect("create repo dir");
        let status = Command::new("git")
            .args(["init", "-q", "--bare"])
            .arg(repo.path())
            .env("HOME", home.path())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .status()
            .expect("run git init");
        assert!(status.success());
        Some(Self { home, repo })
    }

    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Writes `<git_dir>/refgate.toml`.
    pub fn project_config(&self, text: &str) {
        std::fs::write(self.git_dir().join("refgate.toml"), text).expect("write config");
    }

    /// Applies the isolated environment to `cmd`.
    pub fn isolate(&self, cmd: &mut assert_cmd::Command) {
        cmd.timeout(TIMEOUT_BASIC)
            .env("HOME", self.home.path())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env_remove("REFGATE_LOG")
            .env_remove("GIT_DIR")
            .current_dir(self.home.path());
    }

    /// `refgate --git-dir <repo>` with an isolated environment.
    pub fn refgate(&self) -> assert_cmd::Command {
        let mut cmd: assert_cmd::Command = cargo_bin_cmd!("refgate");
        self.isolate(&mut cmd);
        cmd.arg("--git-dir").arg(self.git_dir());
        cmd
    }

    /// Writes an executable shell script.
    #[cfg(unix)]
    pub fn script(&self, relative: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.git_dir().join(relative);
        std::fs::create_dir_all(path.parent().expect("script parent")).expect("mkdir");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
        path
    }
}

impl Fixture {
    /// Runs git with the isolated environment and a fixed identity.
    pub fn git(&self, cwd: &Path, args: &[&str]) -> std::process::Output {
        Command::new("git")
            .args(args)
            .current_dir(cwd)
            .env("HOME", self.home.path())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_AUTHOR_NAME", "Test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "Test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .env("USER", "alice")
            .env_remove("GIT_DIR")
            .env_remove("REFGATE_LOG")
            .output()
            .expect("run git")
    }

    /// Like [`git`](Self::git), failing the test on a non-zero exit.
    pub fn git_ok(&self, cwd: &Path, args: &[&str]) {
        let output = self.git(cwd, args);
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Installs the `refgate` binary as the repository's hook for `event`.
    #[cfg(unix)]
    pub fn install_hook(&self, event: &str) {
        let hooks = self.git_dir().join("hooks");
        std::fs::create_dir_all(&hooks).expect("create hooks dir");
        let link = hooks.join(event);
        let _ = std::fs::remove_file(&link);
        std::os::unix::fs::symlink(assert_cmd::cargo::cargo_bin!("refgate"), &link)
            .expect("link hook");
    }

    /// Creates a working clone with one commit on `main` pushed to the fixture.
    pub fn clone_with_main(&self) -> TempDir {
        let work = TempDir::new().expect("create work dir");
        let remote = self.git_dir().display().to_string();
        self.git_ok(work.path(), &["init", "-q", "-b", "main"]);
        self.git_ok(work.path(), &["remote", "add", "origin", &remote]);
        self.git_ok(work.path(), &["commit", "-q", "--allow-empty", "-m", "first"]);
        self.git_ok(work.path(), &["push", "-q", "origin", "main"]);
        work
    }
}

/// `refgate` with no repository options.
pub fn refgate_raw() -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("refgate");
    cmd.timeout(TIMEOUT_BASIC);
    cmd
}
