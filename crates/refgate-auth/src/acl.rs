//! Access-control rules for reference updates.
//!
//! A rule is three whitespace-separated fields:
//!
//! ```text
//! who        what   refs
//! @devs      CRUD   ^refs/heads/feature/{USER}/
//! ^ci-       U      refs/heads/main
//! mallory    -      !^refs/heads/sandbox/
//! ```
//!
//! | Field | Form | Meaning |
//! |-------|------|---------|
//! | who | `name` | exact user name |
//! | who | `@group` | recursive group membership |
//! | who | `^regex` | case-insensitive regex on the user name |
//! | what | `CRUD` subset | operations granted |
//! | what | `-` | no access |
//! | refs | `name` | exact reference name |
//! | refs | `^regex` | regex on the reference name |
//! | refs | `!regex` | reference name does NOT match |
//!
//! `{USER}` in the refs field is replaced by the acting user (escaped when
//! the field is a regex).
//!
//! # Evaluation
//!
//! Rules are scanned in order and the first rule matching both the user and
//! the reference decides. A matching rule that lacks the operation denies;
//! later rules are never consulted. No matching rule also denies.

use crate::group::{Membership, GROUP_SIGIL};
use crate::{AclConfigError, AclError, GroupSpecError, Operation};
use regex::Regex;
use std::fmt;

/// Placeholder replaced by the acting user in reference specs.
pub const USER_PLACEHOLDER: &str = "{USER}";

fn compile(pattern: &str) -> Result<Regex, AclConfigError> {
    Regex::new(pattern).map_err(|source| AclConfigError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

/// Who a rule (or an admin entry) applies to.
#[derive(Debug, Clone)]
pub enum WhoSpec {
    /// Exact user name.
    User(String),
    /// Group name, without the sigil.
    Group(String),
    /// Case-insensitive regex, starting with `^`.
    Pattern(Regex),
}

impl WhoSpec {
    /// Parses a who field.
    ///
    /// # Errors
    ///
    /// Returns [`AclConfigError::InvalidRegex`] for a bad `^` pattern.
    pub fn parse(spec: &str) -> Result<Self, AclConfigError> {
        if let Some(group) = spec.strip_prefix(GROUP_SIGIL) {
            Ok(Self::Group(group.to_string()))
        } else if spec.starts_with('^') {
            compile(&format!("(?i){spec}")).map(Self::Pattern)
        } else {
            Ok(Self::User(spec.to_string()))
        }
    }

    /// Returns `true` if matching this spec needs group definitions.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Returns `true` if `user` matches.
    ///
    /// # Errors
    ///
    /// Returns [`GroupSpecError::UnknownGroup`] for an undefined group.
    pub fn matches<M>(&self, user: &str, groups: &M) -> Result<bool, GroupSpecError>
    where
        M: Membership + ?Sized,
    {
        match self {
            Self::User(name) => Ok(name == user),
            Self::Group(group) => groups.is_member(user, group),
            Self::Pattern(re) => Ok(re.is_match(user)),
        }
    }
}

/// The operations a rule grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhatSpec {
    /// `-`: nothing.
    NoAccess,
    /// A non-empty subset of `CRUD`.
    Grants(Vec<Operation>),
}

impl WhatSpec {
    /// Parses a what field.
    ///
    /// # Errors
    ///
    /// Returns [`AclConfigError::InvalidWhat`] for anything but `-` or a
    /// non-empty string of `C`, `R`, `U`, `D`.
    pub fn parse(spec: &str) -> Result<Self, AclConfigError> {
        if spec == "-" {
            return Ok(Self::NoAccess);
        }
        if spec.is_empty() {
            return Err(AclConfigError::InvalidWhat {
                spec: spec.to_string(),
            });
        }
        spec.chars()
            .map(|c| {
                Operation::from_char(c).ok_or_else(|| AclConfigError::InvalidWhat {
                    spec: spec.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Grants)
    }

    /// Returns `true` if `op` is granted.
    #[must_use]
    pub fn allows(&self, op: Operation) -> bool {
        match self {
            Self::NoAccess => false,
            Self::Grants(ops) => ops.contains(&op),
        }
    }
}

/// Which references a rule applies to.
#[derive(Debug, Clone)]
pub enum RefSpec {
    /// Exact reference name.
    Exact(String),
    /// Regex starting with `^`.
    Pattern(Regex),
    /// `!regex`: references that do not match.
    NotPattern(Regex),
}

impl RefSpec {
    /// Parses a refs field, substituting `{USER}` when a user is known.
    ///
    /// # Errors
    ///
    /// Returns [`AclConfigError::InvalidRegex`] for a bad pattern.
    pub fn parse(spec: &str, user: Option<&str>) -> Result<Self, AclConfigError> {
        if let Some(pattern) = spec.strip_prefix('!') {
            let pattern = interpolate(pattern, user, true);
            compile(&pattern).map(Self::NotPattern)
        } else if spec.starts_with('^') {
            let pattern = interpolate(spec, user, true);
            compile(&pattern).map(Self::Pattern)
        } else {
            Ok(Self::Exact(interpolate(spec, user, false)))
        }
    }

    /// Returns `true` if `ref_name` matches.
    #[must_use]
    pub fn matches(&self, ref_name: &str) -> bool {
        match self {
            Self::Exact(name) => name == ref_name,
            Self::Pattern(re) => re.is_match(ref_name),
            Self::NotPattern(re) => !re.is_match(ref_name),
        }
    }
}

fn interpolate(spec: &str, user: Option<&str>, is_regex: bool) -> String {
    match user {
        Some(user) if spec.contains(USER_PLACEHOLDER) => {
            let value = if is_regex {
                regex::escape(user)
            } else {
                user.to_string()
            };
            spec.replace(USER_PLACEHOLDER, &value)
        }
        _ => spec.to_string(),
    }
}

/// One access rule.
#[derive(Debug, Clone)]
pub struct AclRule {
    /// Who the rule applies to.
    pub who: WhoSpec,
    /// What the rule grants.
    pub what: WhatSpec,
    /// Which references the rule covers.
    pub refs: RefSpec,
    source: String,
}

impl AclRule {
    /// Parses a `who what refs` rule.
    ///
    /// # Errors
    ///
    /// Returns [`AclConfigError`] for a wrong field count, an invalid what
    /// field or a bad regex.
    pub fn parse(text: &str, user: Option<&str>) -> Result<Self, AclConfigError> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        let [who, what, refs] = fields.as_slice() else {
            return Err(AclConfigError::MalformedRule(text.trim().to_string()));
        };
        Ok(Self {
            who: WhoSpec::parse(who)?,
            what: WhatSpec::parse(what)?,
            refs: RefSpec::parse(refs, user)?,
            source: text.trim().to_string(),
        })
    }

    /// Returns the rule as written in configuration.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for AclRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Outcome of authorizing one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The user matched an admin spec; rules were not consulted.
    Admin,
    /// Rule `index` matched and grants the operation.
    Granted { rule: usize },
    /// Rule `index` matched but does not grant the operation.
    Denied { rule: usize },
    /// No rule matched the user and reference.
    NoMatch,
}

impl Decision {
    /// Returns `true` if the operation may proceed.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Admin | Self::Granted { .. })
    }
}

/// Authorizes `op` on `ref_name` for `user`.
///
/// Admin specs are checked first and short-circuit everything else.
///
/// # Errors
///
/// Returns [`AclError::Group`] if a `@group` spec that had to be consulted is
/// undefined.
pub fn authorize<M>(
    user: &str,
    ref_name: &str,
    op: Operation,
    rules: &[AclRule],
    admins: &[WhoSpec],
    groups: &M,
) -> Result<Decision, AclError>
where
    M: Membership + ?Sized,
{
    for admin in admins {
        if admin.matches(user, groups)? {
            tracing::debug!(user, ref_name, op = %op, "admin bypass");
            return Ok(Decision::Admin);
        }
    }

    for (index, rule) in rules.iter().enumerate() {
        if !rule.refs.matches(ref_name) || !rule.who.matches(user, groups)? {
            continue;
        }
        let decision = if rule.what.allows(op) {
            Decision::Granted { rule: index }
        } else {
            Decision::Denied { rule: index }
        };
        tracing::debug!(
            user,
            ref_name,
            op = %op,
            rule = rule.source(),
            granted = decision.is_granted(),
            "first matching rule"
        );
        return Ok(decision);
    }

    tracing::debug!(user, ref_name, op = %op, "no matching rule");
    Ok(Decision::NoMatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GroupMap;

    const OPS: [Operation; 4] = [
        Operation::Create,
        Operation::Rewrite,
        Operation::Update,
        Operation::Delete,
    ];

    fn rules(lines: &[&str], user: &str) -> Vec<AclRule> {
        lines
            .iter()
            .map(|l| AclRule::parse(l, Some(user)).unwrap())
            .collect()
    }

    fn groups() -> GroupMap {
        GroupMap::parse("leads = alice\ndevs = bob @leads\n").unwrap()
    }

    // ── Spec parsing ────────────────────────────────────────

    #[test]
    fn what_spec_parsing() {
        assert_eq!(WhatSpec::parse("-").unwrap(), WhatSpec::NoAccess);
        let ops = WhatSpec::parse("CU").unwrap();
        assert!(ops.allows(Operation::Create));
        assert!(ops.allows(Operation::Update));
        assert!(!ops.allows(Operation::Delete));
    }

    #[test]
    fn what_spec_rejects_unknown_letters() {
        for bad in ["CX", "", "crud", "C-"] {
            assert!(
                matches!(
                    WhatSpec::parse(bad),
                    Err(AclConfigError::InvalidWhat { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rule_field_count() {
        assert!(matches!(
            AclRule::parse("alice CRUD", None),
            Err(AclConfigError::MalformedRule(_))
        ));
        assert!(AclRule::parse("alice CRUD refs/heads/main extra", None).is_err());
    }

    #[test]
    fn bad_regex_is_config_error() {
        assert!(matches!(
            AclRule::parse("^( CRUD refs/heads/main", None),
            Err(AclConfigError::InvalidRegex { .. })
        ));
        assert!(matches!(
            AclRule::parse("alice CRUD ^refs/(", None),
            Err(AclConfigError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn who_regex_is_case_insensitive() {
        let who = WhoSpec::parse("^ci-").unwrap();
        assert!(who.matches("CI-bot", &GroupMap::new()).unwrap());
        assert!(!who.matches("my-ci-bot", &GroupMap::new()).unwrap());
    }

    #[test]
    fn ref_spec_kinds() {
        let exact = RefSpec::parse("refs/heads/main", None).unwrap();
        assert!(exact.matches("refs/heads/main"));
        assert!(!exact.matches("refs/heads/main2"));

        let pattern = RefSpec::parse("^refs/tags/", None).unwrap();
        assert!(pattern.matches("refs/tags/v1"));
        assert!(!pattern.matches("refs/heads/tags/"));

        let negated = RefSpec::parse("!^refs/heads/sandbox/", None).unwrap();
        assert!(negated.matches("refs/heads/main"));
        assert!(!negated.matches("refs/heads/sandbox/x"));
    }

    #[test]
    fn user_placeholder_is_escaped_in_regex() {
        let spec = RefSpec::parse("^refs/heads/{USER}/", Some("a.b")).unwrap();
        assert!(spec.matches("refs/heads/a.b/topic"));
        assert!(!spec.matches("refs/heads/axb/topic"));

        let exact = RefSpec::parse("refs/heads/{USER}", Some("a.b")).unwrap();
        assert!(exact.matches("refs/heads/a.b"));
    }

    // ── Evaluation ──────────────────────────────────────────

    #[test]
    fn first_match_wins_over_later_grant() {
        let rules = rules(&["u1 - r1", "u1 CRUD r1"], "u1");
        for op in OPS {
            let d = authorize("u1", "r1", op, &rules, &[], &GroupMap::new()).unwrap();
            assert_eq!(d, Decision::Denied { rule: 0 });
            assert!(!d.is_granted());
        }
    }

    #[test]
    fn matching_rule_without_operation_denies() {
        let rules = rules(&["u1 U r1", "u1 CRUD r1"], "u1");
        let d = authorize("u1", "r1", Operation::Delete, &rules, &[], &GroupMap::new()).unwrap();
        assert_eq!(d, Decision::Denied { rule: 0 });
        let d = authorize("u1", "r1", Operation::Update, &rules, &[], &GroupMap::new()).unwrap();
        assert_eq!(d, Decision::Granted { rule: 0 });
    }

    #[test]
    fn non_matching_rules_are_skipped() {
        let rules = rules(&["other - r1", "u1 - r2", "u1 C r1"], "u1");
        let d = authorize("u1", "r1", Operation::Create, &rules, &[], &GroupMap::new()).unwrap();
        assert_eq!(d, Decision::Granted { rule: 2 });
    }

    #[test]
    fn default_deny() {
        let rules = rules(&["other CRUD r1"], "u1");
        let d = authorize("u1", "r1", Operation::Create, &rules, &[], &GroupMap::new()).unwrap();
        assert_eq!(d, Decision::NoMatch);
        assert!(!d.is_granted());
    }

    #[test]
    fn group_rules_follow_nesting() {
        let rules = rules(&["@devs CRUD ^refs/heads/"], "alice");
        let d = authorize(
            "alice",
            "refs/heads/main",
            Operation::Rewrite,
            &rules,
            &[],
            &groups(),
        )
        .unwrap();
        assert!(d.is_granted());
    }

    #[test]
    fn unknown_group_is_an_error() {
        let rules = rules(&["@ghosts CRUD ^refs/"], "alice");
        let err = authorize(
            "alice",
            "refs/heads/main",
            Operation::Update,
            &rules,
            &[],
            &groups(),
        )
        .unwrap_err();
        assert!(matches!(err, AclError::Group(GroupSpecError::UnknownGroup(_))));
    }

    #[test]
    fn admin_bypasses_all_rules() {
        let rules = rules(&["^. - ^."], "root");
        let admins = vec![WhoSpec::parse("@leads").unwrap()];
        for op in OPS {
            let d = authorize("alice", "refs/anything", op, &rules, &admins, &groups()).unwrap();
            assert_eq!(d, Decision::Admin);
        }
        let d = authorize("bob", "refs/anything", Operation::Create, &rules, &admins, &groups())
            .unwrap();
        assert_eq!(d, Decision::Denied { rule: 0 });
    }

    #[test]
    fn per_user_namespace() {
        let alice = rules(&["^. CRUD ^refs/heads/feature/{USER}/"], "alice");
        let d = authorize(
            "alice",
            "refs/heads/feature/alice/x",
            Operation::Create,
            &alice,
            &[],
            &GroupMap::new(),
        )
        .unwrap();
        assert!(d.is_granted());

        let bob = rules(&["^. CRUD ^refs/heads/feature/{USER}/"], "bob");
        let d = authorize(
            "bob",
            "refs/heads/feature/alice/x",
            Operation::Create,
            &bob,
            &[],
            &GroupMap::new(),
        )
        .unwrap();
        assert_eq!(d, Decision::NoMatch);
    }
}
