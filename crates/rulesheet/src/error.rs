//! Error types.
//!
//! Most failures in the pipeline are not errors: an unrecognized rule is
//! skipped (`None`) and a failed renderer call is reported as `false`. The
//! types here cover the cases a caller has to handle explicitly.

/// Usage errors when registering rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// A rule with this key already exists in the target rule list.
    ///
    /// Keys derive class names and animation names, so a second rule with
    /// the same key is refused instead of overwriting the first one. Use
    /// `replace` to swap a rule deliberately.
    #[error("rule key '{key}' is already registered in this list")]
    DuplicateKey {
        /// The rejected key.
        key: String,
    },
}

/// Errors produced when turning text into a style description.
#[derive(Debug, thiserror::Error)]
pub enum StyleParseError {
    /// The input is not valid JSON or doesn't fit the value model.
    #[error("invalid style description: {0}")]
    Json(#[from] serde_json::Error),
    /// The top-level value was not an object.
    #[error("style description must be an object, found {found}")]
    NotAnObject {
        /// What was found instead.
        found: &'static str,
    },
}
