//! Configuration management with layered scopes.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────────┐
//! │  1. Overrides (-c key=value)                 │  Per invocation
//! ├──────────────────────────────────────────────┤
//! │  2. Project Config (<git_dir>/refgate.toml)  │  Repository-specific
//! ├──────────────────────────────────────────────┤
//! │  3. Global Config (~/.refgate/config.toml)   │  User defaults
//! ├──────────────────────────────────────────────┤
//! │  4. git config (system < global < local)     │  Native git settings
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Unlike a typed settings struct, nothing is overwritten: multi-valued
//! keys (`githooks.admin`, `githooks.checkacls.acl`, ...) collect values
//! from every layer in order.
//!
//! # Keys
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `<ns>.<event>` | plugin names to run for the event |
//! | `<ns>.plugins` | extra plugin directories |
//! | `<ns>.externals` | run external hooks (default true) |
//! | `<ns>.hooks` | extra external-hook roots |
//! | `<ns>.groups` | group definitions, literal or `file:` |
//! | `<ns>.admin` | who-specs that bypass ACLs |
//! | `<ns>.userenv` | where the acting user comes from (default `USER`) |
//! | `<ns>.checkacls.acl` | ACL rules |
//!
//! # Example Configuration
//!
//! ```toml
//! # <git_dir>/refgate.toml
//! [githooks]
//! pre-receive = ["check-acls"]
//! admin = ["@leads"]
//! groups = "file:groups.txt"
//!
//! [githooks.checkacls]
//! acl = ["^. CRUD ^refs/heads/feature/{USER}/"]
//! ```

mod error;
mod loader;
mod source;
mod store;

pub use error::ConfigError;
pub(crate) use error::toml_summary;
pub use loader::ConfigLoader;
pub use source::ValueSource;
pub use store::{ConfigScope, ConfigStore};

use std::path::PathBuf;

/// Default configuration namespace.
pub const DEFAULT_NAMESPACE: &str = "githooks";

/// Global config directory name, under the home directory.
pub const GLOBAL_CONFIG_DIR: &str = ".refgate";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// Project config file name, inside the git directory.
pub const PROJECT_CONFIG_FILE: &str = "refgate.toml";

/// Returns `~/.refgate/config.toml`, if a home directory is known.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE))
}
