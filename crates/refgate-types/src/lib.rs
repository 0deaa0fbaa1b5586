//! Core types for refgate.
//!
//! This crate is the leaf of the workspace. It holds the vocabulary every
//! other layer speaks:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  refgate-types   : EventName, ObjectId, AffectedRef  ◄── HERE│
//! ├─────────────────────────────────────────────────────────────┤
//! │  refgate-auth    : groups, ACL rules, classification        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  refgate-runtime : config, session, plugins, dispatcher     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  refgate-cli     : the `refgate` binary                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use refgate_types::{AffectedRef, EventName, ObjectId};
//!
//! let event: EventName = "pre-receive".parse().unwrap();
//! assert!(event.streams_refs());
//!
//! let zero = ObjectId::zero().to_string();
//! let line = format!("{zero} {} refs/heads/topic", "a".repeat(40));
//! let r = AffectedRef::parse_line(&line).unwrap();
//! assert!(r.is_create());
//! ```

mod error;
mod event;
mod reference;

pub use error::{assert_error_code, single_line, ErrorCode};
pub use event::{EventName, RefSource, UnknownEvent};
pub use reference::{AffectedRef, ObjectId, RefParseError, BRANCH_PREFIX};
