//! Plugins compiled into the binary.
//!
//! This table is the last tier of plugin resolution.

mod check_acls;

pub use check_acls::{AclHandler, CheckAcls, ACL_KEY, CHECK_ACLS};

use super::Plugin;

/// Constructs a plugin instance.
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin>>;

/// Name → constructor table for built-in plugins.
pub struct BuiltinTable {
    entries: Vec<(String, PluginFactory)>,
}

impl BuiltinTable {
    /// Creates an empty table.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates the table of plugins shipped with refgate.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.insert(CHECK_ACLS, || Box::new(CheckAcls));
        table.insert("CheckAcls", || Box::new(CheckAcls));
        table
    }

    /// Adds or replaces the constructor for `name`.
    pub fn insert(&mut self, name: impl Into<String>, factory: impl Fn() -> Box<dyn Plugin> + 'static) {
        let name = name.into();
        self.entries.retain(|(n, _)| *n != name);
        self.entries.push((name, Box::new(factory)));
    }

    /// Instantiates the plugin named `name`.
    #[must_use]
    pub fn create(&self, name: &str) -> Option<Box<dyn Plugin>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, factory)| factory())
    }

    /// Returns `true` if `name` is a built-in.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Built-in names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl Default for BuiltinTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for BuiltinTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
