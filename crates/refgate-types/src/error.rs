//! Unified error code interface for refgate.
//!
//! Every error type in the workspace implements [`ErrorCode`] so that the
//! binary can report a stable machine-readable code next to the
//! human-readable diagnostic.
//!
//! # Example
//!
//! ```
//! use refgate_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum LoadError {
//!     Missing(String),
//! }
//!
//! impl ErrorCode for LoadError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Missing(_) => "LOAD_MISSING",
//!         }
//!     }
//! }
//!
//! let err = LoadError::Missing("x".into());
//! assert_eq!(err.code(), "LOAD_MISSING");
//! assert!(!err.is_recoverable());
//! ```

/// Machine-readable error codes.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, e.g. `"GROUP_UNKNOWN"`
/// - **Namespace-prefixed** by the owning component (`ACL_`, `CONFIG_`, ...)
/// - **Stable**: codes are part of the diagnostic contract
///
/// # Recoverability
///
/// A hook run is a single-shot decision. Nothing inside one run is retried,
/// so the default is `false`; the client fixes the condition and pushes again.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the same operation might succeed.
    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Asserts that an error code follows the workspace conventions.
///
/// # Panics
///
/// Panics if the code is empty, lacks `expected_prefix`, or is not
/// UPPER_SNAKE_CASE.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Folds multi-line text (tool stderr, parser snippets) into one line.
///
/// Lines are trimmed, blank lines dropped, and the rest joined with `"; "`.
///
/// ```
/// assert_eq!(refgate_types::single_line("  a\n\n b \n"), "a; b");
/// ```
#[must_use]
pub fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

fn is_upper_snake_case(s: &str) -> bool {
    !s.starts_with('_')
        && !s.ends_with('_')
        && !s.contains("__")
        && s.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
