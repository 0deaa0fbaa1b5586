//! Full dispatch runs against temporary repository layouts.

use refgate_runtime::config::{ConfigLoader, ConfigScope, ConfigStore, PROJECT_CONFIG_FILE};
use refgate_runtime::hook::{FnHandler, HandlerRegistry, HookAction};
use refgate_runtime::plugin::{Plugin, PluginError, PluginResolver};
use refgate_runtime::{DispatchError, Dispatcher, GitRepository, Invocation, Session};
use refgate_types::{EventName, ObjectId};
use std::cell::{Cell, RefCell};
use std::io::Cursor;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

const A: &str = "1111111111111111111111111111111111111111";
const B: &str = "2222222222222222222222222222222222222222";

fn store(pairs: &[(&str, &str)]) -> ConfigStore {
    let mut config = ConfigStore::new();
    config.extend(ConfigScope::Override, pairs.iter().copied());
    config
}

fn update_args(name: &str, old: &str, new: &str) -> Vec<String> {
    vec![name.to_string(), old.to_string(), new.to_string()]
}

struct Counting {
    installs: Rc<Cell<usize>>,
}

impl Plugin for Counting {
    fn name(&self) -> &str {
        "A"
    }

    fn install(&self, registry: &mut HandlerRegistry, session: &Session) -> Result<(), PluginError> {
        self.installs.set(self.installs.get() + 1);
        registry.register(
            session.event(),
            Box::new(FnHandler::new("A", |_| Ok(HookAction::Continue))),
        );
        Ok(())
    }
}

#[test]
fn repeated_plugin_name_loads_once() {
    let git_dir = TempDir::new().unwrap();
    let session = Session::new(
        store(&[("githooks.pre-commit", "A"), ("githooks.pre-commit", "A")]),
        GitRepository::new(git_dir.path()),
        Invocation::with_refs(EventName::PreCommit, vec![], vec![]),
    );

    let installs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&installs);
    let resolver = PluginResolver::from_session(&session).with_builtin("A", move || {
        Box::new(Counting {
            installs: Rc::clone(&counter),
        })
    });

    let report = Dispatcher::with_resolver(resolver).run(&session).unwrap();
    assert_eq!(installs.get(), 1);
    assert_eq!(report.plugins, 1);
    assert_eq!(report.handlers, 1);
}

#[test]
fn handler_sees_every_streamed_reference() {
    let git_dir = TempDir::new().unwrap();
    let zero = ObjectId::zero();
    let stdin = format!(
        "{zero} {A} refs/heads/one\n{A} {B} refs/heads/two\n{B} {zero} refs/heads/three\n"
    );
    let invocation = Invocation::read(EventName::PreReceive, vec![], Cursor::new(stdin)).unwrap();
    let session = Session::new(
        ConfigStore::new(),
        GitRepository::new(git_dir.path()),
        invocation,
    );

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut dispatcher = Dispatcher::new(&session);
    dispatcher.registry_mut().register(
        EventName::PreReceive,
        Box::new(FnHandler::new("observer", move |session| {
            sink.borrow_mut()
                .extend(session.refs().iter().map(|r| r.name.clone()));
            Ok(HookAction::Continue)
        })),
    );

    dispatcher.run(&session).unwrap();
    assert_eq!(
        *seen.borrow(),
        ["refs/heads/one", "refs/heads/two", "refs/heads/three"]
    );
}

fn acl_session(git_dir: &Path, user: &str) -> Session {
    std::fs::write(git_dir.join("acting-user"), format!("{user}\n")).unwrap();
    let invocation = Invocation::read(
        EventName::Update,
        update_args("refs/heads/feature/alice/x", ObjectId::zero().as_str(), A),
        Cursor::new(""),
    )
    .unwrap();
    Session::new(
        store(&[
            ("githooks.update", "check-acls"),
            ("githooks.userenv", "file:acting-user"),
            ("githooks.checkacls.acl", "^. CRUD ^refs/heads/feature/{USER}/"),
        ]),
        GitRepository::new(git_dir),
        invocation,
    )
}

#[test]
fn feature_branch_creation_for_owner() {
    let git_dir = TempDir::new().unwrap();
    let session = acl_session(git_dir.path(), "alice");
    let report = Dispatcher::new(&session).run(&session).unwrap();
    assert_eq!(report.plugins, 1);
    assert_eq!(report.handlers, 1);
}

#[test]
fn feature_branch_creation_for_someone_else() {
    let git_dir = TempDir::new().unwrap();
    let session = acl_session(git_dir.path(), "bob");
    let err = Dispatcher::new(&session).run(&session).unwrap_err();
    assert_eq!(err.component(), "policy");
    let msg = err.to_string();
    assert!(msg.contains("bob"), "{msg}");
    assert!(msg.contains("refs/heads/feature/alice/x"), "{msg}");
}

#[test]
fn project_config_drives_the_run() {
    let git_dir = TempDir::new().unwrap();
    std::fs::write(
        git_dir.path().join(PROJECT_CONFIG_FILE),
        r#"
[githooks]
pre-receive = ["check-acls"]
admin = ["@leads"]
groups = "leads = carol"

[githooks.checkacls]
acl = ["^. - ^refs/"]
"#,
    )
    .unwrap();

    let config = ConfigLoader::new()
        .skip_git_config()
        .skip_global_config()
        .with_git_dir(git_dir.path())
        .load()
        .unwrap();
    let stdin = format!("{A} {} refs/heads/main\n", ObjectId::zero());
    let invocation = Invocation::read(EventName::PreReceive, vec![], Cursor::new(stdin)).unwrap();

    let admin = Session::new(
        config.clone(),
        GitRepository::new(git_dir.path()),
        invocation.clone(),
    )
    .with_user("carol");
    Dispatcher::new(&admin).run(&admin).unwrap();

    let other = Session::new(config, GitRepository::new(git_dir.path()), invocation)
        .with_user("dave");
    let err = Dispatcher::new(&other).run(&other).unwrap_err();
    assert!(matches!(err, DispatchError::Policy { .. }));
    assert!(err.to_string().contains("may not delete 'refs/heads/main'"));
}

#[test]
fn unknown_plugin_is_fatal() {
    let git_dir = TempDir::new().unwrap();
    let session = Session::new(
        store(&[("githooks.commit-msg", "missing-plugin")]),
        GitRepository::new(git_dir.path()),
        Invocation::with_refs(EventName::CommitMsg, vec!["MSG".into()], vec![]),
    );
    let err = Dispatcher::new(&session).run(&session).unwrap_err();
    assert_eq!(err.component(), "plugin");
    assert!(err.to_string().contains("missing-plugin"));
}

#[test]
fn broken_manifest_reports_one_line() {
    let git_dir = TempDir::new().unwrap();
    let plugins = git_dir.path().join("githooks");
    std::fs::create_dir_all(&plugins).unwrap();
    std::fs::write(plugins.join("broken.toml"), "command = [\"x\"\n").unwrap();

    let session = Session::new(
        store(&[("githooks.pre-commit", "broken")]),
        GitRepository::new(git_dir.path()),
        Invocation::with_refs(EventName::PreCommit, vec![], vec![]),
    );
    let err = Dispatcher::new(&session).run(&session).unwrap_err();
    assert_eq!(err.component(), "plugin");
    let msg = err.to_string();
    assert_eq!(msg.lines().count(), 1, "{msg}");
    assert!(msg.contains("broken.toml"), "{msg}");
}

#[test]
fn broken_project_config_reports_one_line() {
    let git_dir = TempDir::new().unwrap();
    std::fs::write(git_dir.path().join(PROJECT_CONFIG_FILE), "[githooks\n").unwrap();

    let err = ConfigLoader::new()
        .skip_git_config()
        .skip_global_config()
        .with_git_dir(git_dir.path())
        .load()
        .unwrap_err();
    let err = DispatchError::from(err);
    assert_eq!(err.component(), "config");
    let msg = err.to_string();
    assert_eq!(msg.lines().count(), 1, "{msg}");
    assert!(msg.contains(PROJECT_CONFIG_FILE), "{msg}");
}

#[cfg(unix)]
mod external {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn pre_receive(git_dir: &Path, pairs: &[(&str, &str)]) -> Session {
        let zero = ObjectId::zero();
        let stdin = format!(
            "{zero} {A} refs/heads/one\n{A} {B} refs/heads/two\n{B} {zero} refs/heads/three\n"
        );
        Session::new(
            store(pairs),
            GitRepository::new(git_dir),
            Invocation::read(EventName::PreReceive, vec![], Cursor::new(stdin)).unwrap(),
        )
    }

    #[test]
    fn external_hook_reads_all_lines() {
        let git_dir = TempDir::new().unwrap();
        let out = git_dir.path().join("seen");
        script(
            &git_dir.path().join("hooks.d/pre-receive/record"),
            &format!("cat > {}", out.display()),
        );

        let session = pre_receive(git_dir.path(), &[]);
        let report = Dispatcher::new(&session).run(&session).unwrap();
        assert_eq!(report.externals, 1);

        let seen = std::fs::read_to_string(&out).unwrap();
        let names: Vec<&str> = seen
            .lines()
            .map(|l| l.rsplit(' ').next().unwrap())
            .collect();
        assert_eq!(names, ["refs/heads/one", "refs/heads/two", "refs/heads/three"]);
    }

    #[test]
    fn externals_can_be_disabled() {
        let git_dir = TempDir::new().unwrap();
        script(&git_dir.path().join("hooks.d/pre-receive/deny"), "exit 1");
        let session = pre_receive(git_dir.path(), &[("githooks.externals", "false")]);
        let report = Dispatcher::new(&session).run(&session).unwrap();
        assert_eq!(report.externals, 0);
    }

    #[test]
    fn configured_hook_root_runs_after_default() {
        let git_dir = TempDir::new().unwrap();
        let extra = TempDir::new().unwrap();
        let log = git_dir.path().join("log");
        script(
            &git_dir.path().join("hooks.d/pre-receive/a"),
            &format!("echo default >> {}", log.display()),
        );
        script(
            &extra.path().join("pre-receive/a"),
            &format!("echo extra >> {}", log.display()),
        );

        let root = extra.path().display().to_string();
        let session = pre_receive(git_dir.path(), &[("githooks.hooks", root.as_str())]);
        let report = Dispatcher::new(&session).run(&session).unwrap();
        assert_eq!(report.externals, 2);
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "default\nextra\n");
    }

    #[test]
    fn failing_external_hook_names_executable() {
        let git_dir = TempDir::new().unwrap();
        let hook = git_dir.path().join("hooks.d/pre-receive/quota");
        script(&hook, "exit 7");
        let session = pre_receive(git_dir.path(), &[]);
        let err = Dispatcher::new(&session).run(&session).unwrap_err();
        assert_eq!(err.component(), "external");
        assert!(err.to_string().contains("quota"));
        assert!(err.to_string().contains("code 7"));
    }

    #[test]
    fn manifest_command_plugin_rejects_before_externals() {
        let git_dir = TempDir::new().unwrap();
        let marker = git_dir.path().join("external-ran");
        let plugins = git_dir.path().join("githooks");
        script(&plugins.join("bin/veto"), "cat >/dev/null; exit 1");
        std::fs::write(
            plugins.join("veto.toml"),
            "command = [\"bin/veto\"]\nevents = [\"pre-receive\"]\n",
        )
        .unwrap();
        script(
            &git_dir.path().join("hooks.d/pre-receive/mark"),
            &format!("touch {}", marker.display()),
        );

        let session = pre_receive(git_dir.path(), &[("githooks.pre-receive", "veto")]);
        let err = Dispatcher::new(&session).run(&session).unwrap_err();
        assert_eq!(err.component(), "policy");
        assert!(err.to_string().starts_with("command:veto:"));
        assert!(!marker.exists());
    }
}
