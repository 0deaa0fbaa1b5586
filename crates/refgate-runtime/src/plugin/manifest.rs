//! Plugin manifest files.
//!
//! ```toml
//! # <git_dir>/githooks/size-limit.toml
//! command = ["scripts/size-limit", "--max", "5M"]
//! events = ["pre-receive"]
//! ```
//!
//! or
//!
//! ```toml
//! # <git_dir>/githooks/acls.toml
//! builtin = "check-acls"
//! ```

use super::PluginError;
use crate::config::toml_summary;
use refgate_types::EventName;
use serde::Deserialize;
use std::path::Path;

/// Default manifest extension.
pub const MANIFEST_EXTENSION: &str = "toml";

/// What a manifest asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestKind {
    /// Instantiate a built-in plugin.
    Builtin(String),
    /// Run a program; the first element is the program.
    Command(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    builtin: Option<String>,
    command: Option<Vec<String>>,
    #[serde(default)]
    events: Vec<EventName>,
}

/// A parsed plugin manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginManifest {
    /// Built-in or command.
    pub kind: ManifestKind,
    /// Events a command plugin attaches to; empty means the current event.
    pub events: Vec<EventName>,
}

impl PluginManifest {
    /// Reads and validates the manifest for plugin `name` at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Load`] if the file cannot be read or is not a
    /// valid manifest.
    pub fn load(name: &str, path: &Path) -> Result<Self, PluginError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PluginError::load(name, path, e.to_string()))?;
        Self::parse(name, path, &text)
    }

    /// Parses manifest text.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Load`] unless exactly one of `builtin` and a
    /// non-empty `command` is present. `events` is only valid with
    /// `command`.
    pub fn parse(name: &str, path: &Path, text: &str) -> Result<Self, PluginError> {
        let raw: RawManifest =
            toml::from_str(text).map_err(|e| PluginError::load(name, path, toml_summary(&e)))?;

        let kind = match (raw.builtin, raw.command) {
            (Some(builtin), None) => {
                if !raw.events.is_empty() {
                    return Err(PluginError::load(
                        name,
                        path,
                        "`events` applies to command plugins only",
                    ));
                }
                ManifestKind::Builtin(builtin)
            }
            (None, Some(command)) if !command.is_empty() => ManifestKind::Command(command),
            (None, Some(_)) => return Err(PluginError::load(name, path, "`command` is empty")),
            (Some(_), Some(_)) => {
                return Err(PluginError::load(
                    name,
                    path,
                    "`builtin` and `command` are mutually exclusive",
                ))
            }
            (None, None) => {
                return Err(PluginError::load(
                    name,
                    path,
                    "expected `builtin` or `command`",
                ))
            }
        };

        Ok(Self {
            kind,
            events: raw.events,
        })
    }
}
