//! External hooks: programs on disk run as subprocesses.
//!
//! # Layout
//!
//! ```text
//! <git_dir>/hooks.d/          default root
//! ├── pre-receive/
//! │   ├── 10-size-limit       every executable file runs
//! │   └── 20-notify
//! └── commit-msg/
//!     └── check-format
//! ```
//!
//! Further roots come from `<ns>.hooks`. The first failing program stops
//! the run.
//!
//! # Protocols
//!
//! | Event | argv | stdin |
//! |-------|------|-------|
//! | `pre-receive`, `post-receive` | event args | `old new ref` per line |
//! | everything else | event args | closed |

mod error;
mod protocol;
mod runner;

pub use error::ExternalHookError;
pub use protocol::HookProtocol;
pub use runner::{invoke, invoke_argv, ExternalHookRunner, DEFAULT_HOOKS_DIR};
