//! Reference-level access control.
//!
//! Installs a handler on `update` and `pre-receive` that classifies every
//! affected reference (C/R/U/D) and authorizes it against the rules in
//! `<ns>.checkacls.acl`. Users matching `<ns>.admin` pass unconditionally.
//!
//! ```toml
//! [githooks]
//! pre-receive = ["check-acls"]
//! admin = ["@leads"]
//! groups = "file:groups.txt"
//!
//! [githooks.checkacls]
//! acl = [
//!     "@devs CRUD ^refs/heads/feature/{USER}/",
//!     "@devs U    refs/heads/main",
//!     "^.    -    ^refs/heads/",
//! ]
//! ```

use crate::hook::{Handler, HandlerRegistry, HookAction, HookError};
use crate::plugin::{Plugin, PluginError};
use crate::session::Session;
use refgate_auth::{authorize, classify, AclRule, Decision, GroupMap, Operation};
use refgate_types::EventName;

/// Built-in name.
pub const CHECK_ACLS: &str = "check-acls";

/// Key, under the namespace, holding the rules. The subsection matches in
/// any case, like the plugin name.
pub const ACL_KEY: &str = "checkacls.acl";

const EVENTS: [EventName; 2] = [EventName::Update, EventName::PreReceive];

/// The `check-acls` plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckAcls;

impl Plugin for CheckAcls {
    fn name(&self) -> &str {
        CHECK_ACLS
    }

    fn install(&self, registry: &mut HandlerRegistry, _session: &Session) -> Result<(), PluginError> {
        registry.register_each(&EVENTS, |_| Box::new(AclHandler));
        Ok(())
    }
}

/// Authorizes every affected reference of the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AclHandler;

fn verb(op: Operation) -> &'static str {
    match op {
        Operation::Create => "create",
        Operation::Rewrite => "rewrite",
        Operation::Update => "update",
        Operation::Delete => "delete",
    }
}

impl Handler for AclHandler {
    fn id(&self) -> &str {
        CHECK_ACLS
    }

    fn handle(&self, session: &Session) -> Result<HookAction, HookError> {
        if session.refs().is_empty() {
            return Ok(HookAction::Continue);
        }

        let user = session.user()?;
        let rules = session
            .config()
            .get_all_any_case(&session.key(ACL_KEY))
            .into_iter()
            .map(|text| AclRule::parse(text, Some(user)))
            .collect::<Result<Vec<_>, _>>()?;
        let admins = session.admins()?;

        let empty = GroupMap::new();
        let needs_groups =
            rules.iter().any(|r| r.who.is_group()) || admins.iter().any(|a| a.is_group());
        let groups = if needs_groups {
            session.groups()?
        } else {
            &empty
        };

        let mut denials = Vec::new();
        for update in session.refs() {
            let op = classify(update, session.repo())?;
            let decision = authorize(user, &update.name, op, &rules, &admins, groups)?;
            if decision.is_granted() {
                continue;
            }
            let why = match decision {
                Decision::Denied { rule } => format!("denied by rule '{}'", rules[rule]),
                _ => "no rule matches".to_string(),
            };
            denials.push(format!(
                "user '{user}' may not {} '{}' ({why})",
                verb(op),
                update.name
            ));
        }

        if denials.is_empty() {
            tracing::info!(user, refs = session.refs().len(), "all references authorized");
            Ok(HookAction::Continue)
        } else {
            Ok(HookAction::abort(denials.join("; ")))
        }
    }
}
