//! Object ids and reference updates.

use crate::ErrorCode;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Namespace holding branches. References outside it are never fast-forwarded.
pub const BRANCH_PREFIX: &str = "refs/heads/";

/// Errors from parsing object ids or reference-update lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefParseError {
    /// Not a 40 (SHA-1) or 64 (SHA-256) digit hexadecimal string.
    #[error("invalid object id: '{0}'")]
    InvalidObjectId(String),

    /// A reference-update line without exactly three fields.
    #[error("malformed reference line: '{0}' (expected 'old new ref')")]
    MalformedLine(String),

    /// An empty reference name.
    #[error("empty reference name")]
    EmptyRefName,
}

impl ErrorCode for RefParseError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidObjectId(_) => "REF_INVALID_OBJECT_ID",
            Self::MalformedLine(_) => "REF_MALFORMED_LINE",
            Self::EmptyRefName => "REF_EMPTY_NAME",
        }
    }
}

/// A git object id in lowercase hexadecimal.
///
/// The all-zero id is the sentinel git uses for "no object": the old id of a
/// created reference and the new id of a deleted one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    /// The SHA-1 zero sentinel.
    #[must_use]
    pub fn zero() -> Self {
        Self("0".repeat(40))
    }

    /// Returns `true` for the all-zero sentinel (of either hash length).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    /// Returns the hexadecimal form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = RefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid_len = s.len() == 40 || s.len() == 64;
        if !valid_len || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(RefParseError::InvalidObjectId(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One reference update within an event.
///
/// Built once per run, either from the `update` event's arguments or from
/// the lines git writes to `pre-receive` / `post-receive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedRef {
    /// Full reference name, e.g. `refs/heads/main`.
    pub name: String,
    /// Object the reference pointed to before the update.
    pub old: ObjectId,
    /// Object the reference will point to after the update.
    pub new: ObjectId,
}

impl AffectedRef {
    /// Builds an affected reference from the `update` argument order
    /// (`ref old new`).
    ///
    /// # Errors
    ///
    /// Returns [`RefParseError`] if the name is empty or an id is invalid.
    pub fn from_args(name: &str, old: &str, new: &str) -> Result<Self, RefParseError> {
        if name.is_empty() {
            return Err(RefParseError::EmptyRefName);
        }
        Ok(Self {
            name: name.to_string(),
            old: old.parse()?,
            new: new.parse()?,
        })
    }

    /// Parses one `old new ref` line as written on a hook's standard input.
    ///
    /// # Errors
    ///
    /// Returns [`RefParseError::MalformedLine`] unless the line has exactly
    /// three whitespace-separated fields.
    pub fn parse_line(line: &str) -> Result<Self, RefParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [old, new, name] = fields.as_slice() else {
            return Err(RefParseError::MalformedLine(line.to_string()));
        };
        Self::from_args(name, old, new)
    }

    /// Formats the reference in the stdin protocol form, without newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{} {} {}", self.old, self.new, self.name)
    }

    /// Returns `true` if the reference did not exist before.
    #[must_use]
    pub fn is_create(&self) -> bool {
        self.old.is_zero()
    }

    /// Returns `true` if the reference is being removed.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.new.is_zero()
    }

    /// Returns `true` if the reference lives under `refs/heads/`.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        self.name.starts_with(BRANCH_PREFIX)
    }
}
