//! Plugin resolution errors.

use refgate_types::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from locating or loading a plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    /// No search directory or built-in matched.
    #[error("plugin '{name}' not found (searched: {searched})")]
    NotFound { name: String, searched: String },

    /// A manifest was found but could not be turned into a plugin.
    #[error("failed to load plugin '{name}' from '{path}': {reason}")]
    Load {
        name: String,
        path: PathBuf,
        reason: String,
    },
}

impl PluginError {
    /// Creates a load error.
    pub fn load(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Load {
            name: name.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl ErrorCode for PluginError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "PLUGIN_NOT_FOUND",
            Self::Load { .. } => "PLUGIN_LOAD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_not_found() {
        let err = PluginError::NotFound {
            name: "x".into(),
            searched: "/a, builtin".into(),
        };
        assert_eq!(err.to_string(), "plugin 'x' not found (searched: /a, builtin)");
    }

    #[test]
    fn display_load_includes_cause() {
        let err = PluginError::load("x", "/p/x.toml", "missing field `command`");
        assert!(err.to_string().contains("missing field `command`"));
        refgate_types::assert_error_code(&err, "PLUGIN_");
    }
}
