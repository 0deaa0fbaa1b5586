//! Plugin resolution with filesystem-based search paths.
//!
//! # Search Order
//!
//! First match wins:
//! 1. `<git_dir>/githooks/`
//! 2. each `<ns>.plugins` directory, in configured order
//! 3. the built-in table
//!
//! In a directory, `{dir}/{name}` is tried first, then `{dir}/{name}.toml`
//! unless the name already ends in `.toml`.

use super::builtin::BuiltinTable;
use super::command::CommandPlugin;
use super::manifest::{ManifestKind, PluginManifest, MANIFEST_EXTENSION};
use super::{Plugin, PluginError};
use crate::hook::HandlerRegistry;
use crate::session::Session;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Repository-local plugin directory, relative to the git dir.
pub const LOCAL_PLUGIN_DIR: &str = "githooks";

/// Where a plugin name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSource {
    /// A manifest file in a search directory.
    Manifest(PathBuf),
    /// An entry of the built-in table.
    Builtin(String),
}

/// What a loaded plugin is, independent of the name it was requested by.
///
/// Built-ins are keyed by their canonical name (so aliases collapse) and
/// command manifests by their canonical path (so `p` and `p.toml` collapse).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PluginKey {
    Builtin(String),
    Command(PathBuf),
}

/// Locates plugins and loads each one at most once per run.
///
/// Names that reach the same plugin (a built-in alias, a manifest with or
/// without its extension) count as the same plugin.
///
/// # Example
///
/// ```
/// use refgate_runtime::plugin::{PluginResolver, PluginSource};
///
/// let resolver = PluginResolver::new().with_path("/nonexistent/plugins");
/// assert_eq!(
///     resolver.locate("check-acls").unwrap(),
///     PluginSource::Builtin("check-acls".into())
/// );
/// assert!(resolver.locate("no-such-plugin").is_err());
/// ```
#[derive(Debug)]
pub struct PluginResolver {
    search_paths: Vec<PathBuf>,
    builtins: BuiltinTable,
    loaded: Vec<String>,
    installed: HashSet<PluginKey>,
}

impl PluginResolver {
    /// Creates a resolver with no search paths and the standard built-ins.
    #[must_use]
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
            builtins: BuiltinTable::standard(),
            loaded: Vec::new(),
            installed: HashSet::new(),
        }
    }

    /// Creates a resolver for the session's repository and configuration.
    ///
    /// Relative `<ns>.plugins` entries are taken from the git dir.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        let git_dir = session.git_dir();
        let configured: Vec<PathBuf> = session
            .config()
            .get_all(&session.key("plugins"))
            .into_iter()
            .map(|dir| git_dir.join(dir))
            .collect();
        Self::new()
            .with_path(git_dir.join(LOCAL_PLUGIN_DIR))
            .with_paths(configured)
    }

    /// Adds a search path.
    ///
    /// Paths are searched in the order they are added.
    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds multiple search paths.
    #[must_use]
    pub fn with_paths(mut self, paths: impl IntoIterator<Item = impl AsRef<Path>>) -> Self {
        for path in paths {
            self.search_paths.push(path.as_ref().to_path_buf());
        }
        self
    }

    /// Replaces the built-in table.
    #[must_use]
    pub fn with_builtins(mut self, builtins: BuiltinTable) -> Self {
        self.builtins = builtins;
        self
    }

    /// Adds a built-in plugin constructor.
    #[must_use]
    pub fn with_builtin(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn Plugin> + 'static,
    ) -> Self {
        self.builtins.insert(name, factory);
        self
    }

    /// Returns configured search paths.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
        let mut files = vec![dir.join(name)];
        let suffixed = Path::new(name)
            .extension()
            .is_some_and(|ext| ext == MANIFEST_EXTENSION);
        if !suffixed {
            files.push(dir.join(format!("{name}.{MANIFEST_EXTENSION}")));
        }
        files
    }

    /// Finds where `name` comes from, without loading it.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] listing every location tried.
    pub fn locate(&self, name: &str) -> Result<PluginSource, PluginError> {
        for dir in &self.search_paths {
            for file in Self::candidates(dir, name) {
                if file.is_file() {
                    return Ok(PluginSource::Manifest(file));
                }
            }
        }
        if self.builtins.contains(name) {
            return Ok(PluginSource::Builtin(name.to_string()));
        }

        let mut searched: Vec<String> = self
            .search_paths
            .iter()
            .flat_map(|dir| Self::candidates(dir, name))
            .map(|p| p.display().to_string())
            .collect();
        searched.push("builtin".to_string());

        Err(PluginError::NotFound {
            name: name.to_string(),
            searched: searched.join(", "),
        })
    }

    /// Builds the plugin `source` describes.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Load`] for an invalid manifest or a manifest
    /// naming an unknown built-in.
    pub fn instantiate(
        &self,
        name: &str,
        source: &PluginSource,
    ) -> Result<Box<dyn Plugin>, PluginError> {
        self.build(name, source).map(|(plugin, _)| plugin)
    }

    fn build(
        &self,
        name: &str,
        source: &PluginSource,
    ) -> Result<(Box<dyn Plugin>, PluginKey), PluginError> {
        let builtin = |builtin: &str| {
            self.builtins.create(builtin).map(|plugin| {
                let key = PluginKey::Builtin(plugin.name().to_string());
                (plugin, key)
            })
        };
        match source {
            PluginSource::Builtin(name_in_table) => {
                builtin(name_in_table.as_str()).ok_or_else(|| PluginError::NotFound {
                    name: name.to_string(),
                    searched: "builtin".to_string(),
                })
            }
            PluginSource::Manifest(path) => {
                let manifest = PluginManifest::load(name, path)?;
                match manifest.kind {
                    ManifestKind::Builtin(name_in_table) => {
                        builtin(name_in_table.as_str()).ok_or_else(|| {
                            PluginError::load(
                                name,
                                path,
                                format!("unknown builtin '{name_in_table}'"),
                            )
                        })
                    }
                    ManifestKind::Command(argv) => {
                        let base = path.parent().unwrap_or(Path::new("."));
                        let mut argv = argv.into_iter();
                        let program = argv.next().map(PathBuf::from).unwrap_or_default();
                        let program = if program.components().count() > 1 {
                            base.join(program)
                        } else {
                            program
                        };
                        let key = PluginKey::Command(
                            std::fs::canonicalize(path).unwrap_or_else(|_| path.clone()),
                        );
                        let plugin =
                            CommandPlugin::new(name, program, argv.collect(), manifest.events);
                        Ok((Box::new(plugin) as Box<dyn Plugin>, key))
                    }
                }
            }
        }
    }

    /// Loads `name` into `registry`, unless it was loaded before.
    ///
    /// Returns `true` if the plugin was loaded by this call.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError`] if the plugin cannot be found or loaded.
    pub fn load(
        &mut self,
        name: &str,
        registry: &mut HandlerRegistry,
        session: &Session,
    ) -> Result<bool, PluginError> {
        if self.is_loaded(name) {
            tracing::debug!(plugin = name, "plugin already loaded");
            return Ok(false);
        }

        let source = self.locate(name)?;
        let (plugin, key) = self.build(name, &source)?;
        if self.installed.contains(&key) {
            tracing::debug!(plugin = name, key = ?key, "plugin already loaded under another name");
            return Ok(false);
        }
        plugin.install(registry, session)?;
        self.installed.insert(key);
        self.loaded.push(name.to_string());

        tracing::debug!(plugin = name, source = ?source, "loaded plugin");
        Ok(true)
    }

    /// Returns `true` if `name` was loaded in this run.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.iter().any(|n| n == name)
    }

    /// Names loaded so far, in load order.
    #[must_use]
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }
}

impl Default for PluginResolver {
    fn default() -> Self {
        Self::new()
    }
}
