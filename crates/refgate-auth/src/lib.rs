//! Access control for refgate.
//!
//! # Layers
//!
//! ```text
//! Effective decision = Admin(WHO) ∪ FirstMatch(WHO ∩ WHERE → WHAT)
//! ```
//!
//! | Piece | Module | Purpose |
//! |-------|--------|---------|
//! | [`GroupMap`] | `group` | recursive named user groups |
//! | [`Operation`] / [`classify`] | `operation` | C/R/U/D of a reference update |
//! | [`AclRule`] / [`authorize`] | `acl` | first-match rule evaluation |
//!
//! # Example
//!
//! ```
//! use refgate_auth::{authorize, AclRule, GroupMap, Operation};
//!
//! let groups = GroupMap::parse("devs = alice bob").unwrap();
//! let rules = vec![
//!     AclRule::parse("@devs CRU ^refs/heads/", Some("alice")).unwrap(),
//! ];
//!
//! let ok = authorize("alice", "refs/heads/main", Operation::Update, &rules, &[], &groups)
//!     .unwrap();
//! assert!(ok.is_granted());
//!
//! let no = authorize("alice", "refs/heads/main", Operation::Delete, &rules, &[], &groups)
//!     .unwrap();
//! assert!(!no.is_granted());
//! ```

pub mod acl;
pub mod error;
pub mod group;
pub mod operation;

pub use acl::{authorize, AclRule, Decision, RefSpec, WhatSpec, WhoSpec, USER_PLACEHOLDER};
pub use error::{AclConfigError, AclError, GroupSpecError};
pub use group::{GroupMap, Membership, GROUP_SIGIL};
pub use operation::{classify, Ancestry, Operation};
