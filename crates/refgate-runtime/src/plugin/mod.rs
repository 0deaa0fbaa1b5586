//! Plugins: named policy modules that install handlers.
//!
//! A plugin is resolved by name (see [`PluginResolver`]) and installed
//! once per run. Installing means registering handlers; the checks
//! themselves run when the dispatcher reaches the handler phase.

pub mod builtin;
mod command;
mod error;
mod manifest;
mod resolver;

pub use builtin::{BuiltinTable, CheckAcls, PluginFactory};
pub use command::CommandPlugin;
pub use error::PluginError;
pub use manifest::{ManifestKind, PluginManifest, MANIFEST_EXTENSION};
pub use resolver::{PluginResolver, PluginSource, LOCAL_PLUGIN_DIR};

use crate::hook::HandlerRegistry;
use crate::session::Session;

/// A policy module.
pub trait Plugin {
    /// Canonical plugin name.
    fn name(&self) -> &str;

    /// Registers the plugin's handlers.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError`] if the plugin cannot set itself up.
    fn install(&self, registry: &mut HandlerRegistry, session: &Session) -> Result<(), PluginError>;
}
