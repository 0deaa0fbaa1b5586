//! E2E tests for the `refgate` binary.
//!
//! Each test runs the real binary against a fresh bare repository. Tests
//! return early when git is not installed.

mod common;

use common::{refgate_raw, Fixture, A, ZERO};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

const FEATURE_ACL: &str = r#"
[githooks]
update = "check-acls"

[githooks.checkacls]
acl = ["^. CRUD ^refs/heads/feature/{USER}/"]
"#;

// ─── Options ───────────────────────────────────────────────────────

#[test]
fn version_flag() {
    refgate_raw()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("refgate"));
}

#[test]
fn unknown_event_is_rejected() {
    refgate_raw()
        .arg("pre-pushy")
        .assert()
        .failure()
        .stderr(contains("pre-pushy"));
}

#[test]
fn no_plugins_configured_permits_event() {
    let Some(fx) = Fixture::new() else { return };
    fx.refgate()
        .args(["commit-msg", "MSG"])
        .assert()
        .success()
        .stderr(contains("refgate:").not());
}

#[test]
fn malformed_override_is_config_error() {
    let Some(fx) = Fixture::new() else { return };
    fx.refgate()
        .args(["-c", "githooks.externals", "pre-commit"])
        .assert()
        .code(1)
        .stderr(contains("refgate: config:"));
}

#[test]
fn broken_project_config_is_one_line() {
    let Some(fx) = Fixture::new() else { return };
    fx.project_config("[githooks\npre-commit = \"x\"\n");
    let output = fx.refgate().arg("pre-commit").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.lines().count(), 1, "{stderr}");
    assert!(stderr.starts_with("refgate: config:"), "{stderr}");
}

#[test]
fn update_arity_is_checked() {
    let Some(fx) = Fixture::new() else { return };
    fx.refgate()
        .args(["update", "refs/heads/main"])
        .assert()
        .code(1)
        .stderr(contains("refgate: input:"));
}

#[test]
fn unknown_plugin_is_reported() {
    let Some(fx) = Fixture::new() else { return };
    fx.refgate()
        .args(["-c", "githooks.pre-commit=nowhere", "pre-commit"])
        .assert()
        .code(1)
        .stderr(contains("refgate: plugin:").and(contains("nowhere")));
}

// ─── Access control ────────────────────────────────────────────────

#[test]
fn owner_may_create_feature_branch() {
    let Some(fx) = Fixture::new() else { return };
    fx.project_config(FEATURE_ACL);
    fx.refgate()
        .env("USER", "alice")
        .args(["update", "refs/heads/feature/alice/x", ZERO, A])
        .assert()
        .success();
}

#[test]
fn other_user_may_not_create_feature_branch() {
    let Some(fx) = Fixture::new() else { return };
    fx.project_config(FEATURE_ACL);
    fx.refgate()
        .env("USER", "bob")
        .args(["update", "refs/heads/feature/alice/x", ZERO, A])
        .assert()
        .code(1)
        .stderr(
            contains("refgate: policy:")
                .and(contains("bob"))
                .and(contains("refs/heads/feature/alice/x")),
        );
}

#[test]
fn namespace_option_selects_keys() {
    let Some(fx) = Fixture::new() else { return };
    fx.project_config(FEATURE_ACL);
    // Nothing is configured under `other`, so nothing runs.
    fx.refgate()
        .env("USER", "bob")
        .args(["--namespace", "other", "update", "refs/heads/feature/alice/x", ZERO, A])
        .assert()
        .success();
}

// ─── External hooks ────────────────────────────────────────────────

#[cfg(unix)]
#[test]
fn external_hook_receives_stdin_lines() {
    let Some(fx) = Fixture::new() else { return };
    let out = fx.git_dir().join("seen");
    fx.script(
        "hooks.d/pre-receive/record",
        &format!("cat > {}", out.display()),
    );
    let stdin = format!("{ZERO} {A} refs/heads/one\n{A} {ZERO} refs/heads/two\n");
    fx.refgate()
        .arg("pre-receive")
        .write_stdin(stdin.clone())
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), stdin);
}

#[cfg(unix)]
#[test]
fn failing_external_hook_rejects() {
    let Some(fx) = Fixture::new() else { return };
    fx.script("hooks.d/commit-msg/lint", "echo 'bad message' >&2; exit 3");
    fx.refgate()
        .args(["commit-msg", "MSG"])
        .assert()
        .code(1)
        .stderr(contains("bad message").and(contains("refgate: external:")));
}

#[cfg(unix)]
#[test]
fn externals_disabled_by_override() {
    let Some(fx) = Fixture::new() else { return };
    fx.script("hooks.d/commit-msg/lint", "exit 3");
    fx.refgate()
        .args(["-c", "githooks.externals=false", "commit-msg", "MSG"])
        .assert()
        .success();
}

// ─── Pushes ────────────────────────────────────────────────────────

#[cfg(unix)]
const UPDATE_ONLY: &str = r#"
[githooks]
update = "check-acls"

[githooks.checkacls]
acl = ["^. U ^refs/heads/"]
"#;

#[cfg(unix)]
#[test]
fn fast_forward_push_is_an_update() {
    let Some(fx) = Fixture::new() else { return };
    let work = fx.clone_with_main();
    fx.project_config(UPDATE_ONLY);
    fx.install_hook("update");

    fx.git_ok(work.path(), &["commit", "-q", "--allow-empty", "-m", "second"]);
    let output = fx.git(work.path(), &["push", "origin", "main"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[cfg(unix)]
#[test]
fn forced_push_is_a_rewrite() {
    let Some(fx) = Fixture::new() else { return };
    let work = fx.clone_with_main();
    fx.project_config(UPDATE_ONLY);
    fx.install_hook("update");

    fx.git_ok(work.path(), &["commit", "-q", "--amend", "--allow-empty", "-m", "rewritten"]);
    let output = fx.git(work.path(), &["push", "--force", "origin", "main"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("refgate: policy:"), "{stderr}");
    assert!(stderr.contains("may not rewrite 'refs/heads/main'"), "{stderr}");
}

// ─── Hook mode ─────────────────────────────────────────────────────

#[cfg(unix)]
#[test]
fn hook_mode_takes_event_from_program_name() {
    let Some(fx) = Fixture::new() else { return };
    fx.project_config(FEATURE_ACL);
    let link = fx.git_dir().join("hooks").join("update");
    std::fs::create_dir_all(link.parent().unwrap()).unwrap();
    let _ = std::fs::remove_file(&link);
    std::os::unix::fs::symlink(assert_cmd::cargo::cargo_bin!("refgate"), &link).unwrap();

    let mut cmd = assert_cmd::Command::new(&link);
    fx.isolate(&mut cmd);
    cmd.env("GIT_DIR", fx.git_dir())
        .env("USER", "bob")
        .args(["refs/heads/feature/alice/x", ZERO, A])
        .assert()
        .code(1)
        .stderr(contains("refgate: policy:"));
}
