//! Configuration loader with layered merging.
//!
//! # Load Order
//!
//! 1. Git configuration (`git config --null --list`)
//! 2. Global config (`~/.refgate/config.toml`)
//! 3. Project config (`<git_dir>/refgate.toml`)
//! 4. Command-line overrides (`-c key=value`)
//!
//! Every layer is kept; a single-valued lookup sees the last one.

use super::{default_config_path, ConfigError, ConfigScope, ConfigStore, PROJECT_CONFIG_FILE};
use crate::git::GitRepository;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```no_run
/// use refgate_runtime::config::ConfigLoader;
///
/// let store = ConfigLoader::new()
///     .with_git_dir("/srv/git/project.git")
///     .with_override("githooks.externals=false")
///     .load()?;
/// # Ok::<(), refgate_runtime::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Repository whose git config and `refgate.toml` are read.
    git_dir: Option<PathBuf>,

    /// Global config file path (defaults to ~/.refgate/config.toml).
    global_config_path: Option<PathBuf>,

    /// Raw `key=value` overrides, applied last.
    overrides: Vec<String>,

    skip_git: bool,
    skip_global: bool,
    skip_project: bool,
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the repository git directory.
    #[must_use]
    pub fn with_git_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.git_dir = Some(path.into());
        self
    }

    /// Sets a custom global config path.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Adds one `key=value` override.
    #[must_use]
    pub fn with_override(mut self, pair: impl Into<String>) -> Self {
        self.overrides.push(pair.into());
        self
    }

    /// Adds several `key=value` overrides.
    #[must_use]
    pub fn with_overrides<I, S>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides.extend(pairs.into_iter().map(Into::into));
        self
    }

    /// Skips reading git configuration.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_git_config(mut self) -> Self {
        self.skip_git = true;
        self
    }

    /// Skips global config loading.
    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    /// Skips project config loading.
    #[must_use]
    pub fn skip_project_config(mut self) -> Self {
        self.skip_project = true;
        self
    }

    /// Loads every layer into one store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if git configuration cannot be read, a config
    /// file exists but cannot be parsed, or an override is malformed.
    /// Missing config files are silently ignored.
    pub fn load(&self) -> Result<ConfigStore, ConfigError> {
        let mut store = ConfigStore::new();

        // Layer 1: git
        if !self.skip_git {
            if let Some(ref git_dir) = self.git_dir {
                let pairs = GitRepository::new(git_dir)
                    .config_list()
                    .map_err(ConfigError::Git)?;
                debug!(count = pairs.len(), "Loaded git config");
                store.extend(ConfigScope::Git, pairs);
            }
        }

        // Layer 2: global
        if !self.skip_global {
            let global_path = self.global_config_path.clone().or_else(default_config_path);
            if let Some(global_path) = global_path {
                if let Some(pairs) = load_file(&global_path)? {
                    debug!(path = %global_path.display(), "Loaded global config");
                    store.extend(ConfigScope::Global, pairs);
                }
            }
        }

        // Layer 3: project
        if !self.skip_project {
            if let Some(ref git_dir) = self.git_dir {
                let project_path = git_dir.join(PROJECT_CONFIG_FILE);
                if let Some(pairs) = load_file(&project_path)? {
                    debug!(path = %project_path.display(), "Loaded project config");
                    store.extend(ConfigScope::Project, pairs);
                }
            }
        }

        // Layer 4: overrides
        for raw in &self.overrides {
            let (key, value) = parse_override(raw)?;
            store.push(ConfigScope::Override, key, value);
        }

        debug!(values = store.len(), "Configuration loaded");
        Ok(store)
    }
}

/// Loads a TOML file as flattened pairs, returning None if it doesn't exist.
fn load_file(path: &Path) -> Result<Option<Vec<(String, String)>>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let table: toml::Table = content
        .parse()
        .map_err(|e| ConfigError::parse_toml(path, e))?;

    let mut pairs = Vec::new();
    flatten(path, "", &table, &mut pairs)?;
    Ok(Some(pairs))
}

/// Turns nested tables into dotted keys and arrays into repeated keys.
fn flatten(
    path: &Path,
    prefix: &str,
    table: &toml::Table,
    out: &mut Vec<(String, String)>,
) -> Result<(), ConfigError> {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match value {
            toml::Value::Table(inner) => flatten(path, &key, inner, out)?,
            toml::Value::Array(items) => {
                for item in items {
                    let Some(scalar) = scalar(item) else {
                        return Err(ConfigError::UnsupportedValue {
                            path: path.to_path_buf(),
                            key,
                        });
                    };
                    out.push((key.clone(), scalar));
                }
            }
            other => {
                if let Some(scalar) = scalar(other) {
                    out.push((key, scalar));
                }
            }
        }
    }
    Ok(())
}

fn scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

fn parse_override(raw: &str) -> Result<(&str, &str), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(ConfigError::InvalidOverride(raw.to_string())),
    }
}
