//! Runtime for refgate: everything one hook run needs.
//!
//! # Layers
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ Dispatcher        plugins → handlers → external hooks     │
//! ├──────────────┬──────────────────┬─────────────────────────┤
//! │ PluginResolver│ HandlerRegistry │ ExternalHookRunner      │
//! ├──────────────┴──────────────────┴─────────────────────────┤
//! │ Session   config store, git repository, invocation,      │
//! │           acting user, groups (lazy)                     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use refgate_runtime::config::ConfigLoader;
//! use refgate_runtime::{Dispatcher, GitRepository, Invocation, Session};
//! use refgate_types::EventName;
//!
//! let repo = GitRepository::discover()?;
//! let config = ConfigLoader::new().with_git_dir(repo.git_dir()).load()?;
//! let invocation = Invocation::read(EventName::PreReceive, vec![], std::io::stdin().lock())?;
//! let session = Session::new(config, repo, invocation);
//!
//! Dispatcher::new(&session).run(&session)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod dispatch;
pub mod external;
pub mod git;
pub mod hook;
pub mod invocation;
pub mod plugin;
pub mod session;

pub use dispatch::{DispatchError, DispatchReport, Dispatcher};
pub use git::{GitError, GitRepository};
pub use invocation::{InputError, Invocation};
pub use session::{Session, SessionError};
