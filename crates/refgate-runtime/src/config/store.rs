//! Layered key/value configuration.

use super::ConfigError;
use std::fmt;

/// Where a configuration value came from. Later scopes win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigScope {
    /// `git config` (system, global and repository files, already merged by git).
    Git,
    /// `~/.refgate/config.toml`.
    Global,
    /// `<git_dir>/refgate.toml`.
    Project,
    /// `-c key=value` on the command line.
    Override,
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Git => "git",
            Self::Global => "global",
            Self::Project => "project",
            Self::Override => "override",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    scope: ConfigScope,
    key: String,
    value: String,
}

/// Multi-valued configuration store.
///
/// Keys follow git's rules: the section and the variable name are
/// case-insensitive, a subsection in between keeps its case.
///
/// ```
/// use refgate_runtime::config::{ConfigScope, ConfigStore};
///
/// let mut store = ConfigStore::new();
/// store.push(ConfigScope::Git, "githooks.admin", "alice");
/// store.push(ConfigScope::Override, "GitHooks.Admin", "bob");
///
/// assert_eq!(store.get("githooks.admin"), Some("bob"));
/// assert_eq!(store.get_all("githooks.admin"), vec!["alice", "bob"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    entries: Vec<Entry>,
}

impl ConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one value.
    ///
    /// Values must be pushed in scope order; a value pushed for an earlier
    /// scope after a later one is placed before it.
    pub fn push(&mut self, scope: ConfigScope, key: &str, value: impl Into<String>) {
        let entry = Entry {
            scope,
            key: normalize_key(key),
            value: value.into(),
        };
        let pos = self
            .entries
            .iter()
            .position(|e| e.scope > scope)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
    }

    /// Appends every pair of `values` under `scope`.
    pub fn extend<I, K, V>(&mut self, scope: ConfigScope, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in values {
            self.push(scope, key.as_ref(), value);
        }
    }

    fn matching<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a Entry> + 'a {
        let key = normalize_key(key);
        self.entries.iter().filter(move |e| e.key == key)
    }

    /// Returns the winning value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.matching(key).last().map(|e| e.value.as_str())
    }

    /// Returns every value of `key` in scope order, then declaration order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.matching(key).map(|e| e.value.as_str()).collect()
    }

    /// Like [`get_all`](Self::get_all), but the subsection matches in any
    /// case, so `[githooks "CheckAcls"]` and `[githooks "checkacls"]` both
    /// answer `githooks.checkacls.acl`.
    #[must_use]
    pub fn get_all_any_case(&self, key: &str) -> Vec<&str> {
        let key = normalize_key(key);
        self.entries
            .iter()
            .filter(|e| e.key.eq_ignore_ascii_case(&key))
            .map(|e| e.value.as_str())
            .collect()
    }

    /// Returns every whitespace-separated word of every value of `key`.
    #[must_use]
    pub fn get_words(&self, key: &str) -> Vec<&str> {
        self.matching(key)
            .flat_map(|e| e.value.split_whitespace())
            .collect()
    }

    /// Returns the winning value of `key` as a boolean.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBool`] if the value is not a boolean.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => parse_bool(value).ok_or_else(|| ConfigError::invalid_bool(key, value)),
        }
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercases the section and variable name of a dotted key.
fn normalize_key(key: &str) -> String {
    let key = key.trim();
    let (Some(first), Some(last)) = (key.find('.'), key.rfind('.')) else {
        return key.to_lowercase();
    };
    let section = &key[..first];
    let name = &key[last + 1..];
    if first == last {
        format!("{}.{}", section.to_lowercase(), name.to_lowercase())
    } else {
        let subsection = &key[first + 1..last];
        format!(
            "{}.{}.{}",
            section.to_lowercase(),
            subsection,
            name.to_lowercase()
        )
    }
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off"
/// (case-insensitive). An empty value is false, as in git.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
