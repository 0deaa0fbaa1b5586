//! Named user groups.
//!
//! # Format
//!
//! ```text
//! # comment
//! admins   = alice bob
//! devs     = carol @admins      # nested group, must already be defined
//! ```
//!
//! - Blank lines and text after an unescaped `#` are ignored (`\#` is a
//!   literal hash).
//! - The group name may be written with or without the `@` sigil.
//! - Members with the `@` sigil are nested groups; everything else is a user.
//!
//! Definitions are read in a single pass. A nested group has to be defined
//! on an earlier line, so the member graph is acyclic by construction and
//! membership checks need no cycle bookkeeping.

use crate::GroupSpecError;
use std::collections::{HashMap, HashSet};

/// Sigil marking a group name.
pub const GROUP_SIGIL: char = '@';

/// Anything that can answer group-membership questions.
pub trait Membership {
    /// Returns `true` if `user` belongs to `group`, directly or through
    /// nested groups.
    ///
    /// # Errors
    ///
    /// Returns [`GroupSpecError::UnknownGroup`] if `group` is not defined.
    fn is_member(&self, user: &str, group: &str) -> Result<bool, GroupSpecError>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct GroupDef {
    users: HashSet<String>,
    nested: Vec<String>,
}

/// Parsed group definitions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GroupMap {
    groups: HashMap<String, GroupDef>,
}

impl GroupMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a group specification.
    ///
    /// # Errors
    ///
    /// Returns [`GroupSpecError`] on the first malformed line, redefinition
    /// or reference to a group not yet defined.
    pub fn parse(source: &str) -> Result<Self, GroupSpecError> {
        let mut map = Self::new();

        for (idx, raw) in source.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some((lhs, rhs)) = line.split_once('=') else {
                return Err(GroupSpecError::Malformed {
                    line: line_no,
                    text: raw.to_string(),
                });
            };

            let name = lhs.trim();
            let name = name.strip_prefix(GROUP_SIGIL).unwrap_or(name);
            if !is_valid_name(name) {
                return Err(GroupSpecError::Malformed {
                    line: line_no,
                    text: raw.to_string(),
                });
            }
            if map.groups.contains_key(name) {
                return Err(GroupSpecError::Redefined {
                    line: line_no,
                    name: name.to_string(),
                });
            }

            let mut def = GroupDef::default();
            for token in rhs.split_whitespace() {
                match token.strip_prefix(GROUP_SIGIL) {
                    Some(nested) => {
                        if !map.groups.contains_key(nested) {
                            return Err(GroupSpecError::UndefinedReference {
                                line: line_no,
                                group: name.to_string(),
                                member: nested.to_string(),
                            });
                        }
                        if !def.nested.iter().any(|n| n == nested) {
                            def.nested.push(nested.to_string());
                        }
                    }
                    None => {
                        def.users.insert(token.to_string());
                    }
                }
            }

            tracing::trace!(
                group = name,
                users = def.users.len(),
                nested = def.nested.len(),
                "group defined"
            );
            map.groups.insert(name.to_string(), def);
        }

        Ok(map)
    }

    /// Returns the number of defined groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no groups are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn member_of(&self, user: &str, def: &GroupDef) -> bool {
        if def.users.contains(user) {
            return true;
        }
        // Nested names were validated at parse time.
        def.nested
            .iter()
            .filter_map(|name| self.groups.get(name))
            .any(|nested| self.member_of(user, nested))
    }
}

impl Membership for GroupMap {
    fn is_member(&self, user: &str, group: &str) -> Result<bool, GroupSpecError> {
        let name = unsigil(group);
        let def = self
            .groups
            .get(name)
            .ok_or_else(|| GroupSpecError::UnknownGroup(name.to_string()))?;
        Ok(self.member_of(user, def))
    }
}

fn unsigil(name: &str) -> &str {
    name.strip_prefix(GROUP_SIGIL).unwrap_or(name)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Drops everything from the first unescaped `#`, unescaping `\#`.
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }
    out
}
