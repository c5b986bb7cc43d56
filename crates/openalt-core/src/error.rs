//! Validation errors for catalog input.
//!
//! Stores and form parsers return these inside `anyhow::Error`. Callers
//! tell bad input apart from store failures with
//! [`ValidationError::is_validation`].

use thiserror::Error;

/// Input rejected before or by the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is blank.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// The slug (or the name it is derived from) has no usable characters.
    #[error("invalid slug: '{0}' has no letters or digits")]
    Slug(String),

    /// A URL field without an http(s) scheme.
    #[error("invalid {field}: '{value}' must start with http:// or https://")]
    Url { field: &'static str, value: String },

    /// Another record of the same kind already uses this slug.
    #[error("slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("unknown category id: {0}")]
    UnknownCategory(String),

    #[error("unknown alternative id: {0}")]
    UnknownAlternative(String),

    #[error("invalid date: '{0}' (expected YYYY-MM-DD)")]
    Date(String),

    #[error("{field} must be a whole number")]
    Number { field: &'static str },
}

impl ValidationError {
    /// True when `err` is (or wraps) a validation error.
    pub fn is_validation(err: &anyhow::Error) -> bool {
        err.downcast_ref::<ValidationError>().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_classifies_by_type_not_message() {
        let err = anyhow::Error::new(ValidationError::DuplicateSlug("gitea".into()));
        assert!(ValidationError::is_validation(&err));
        assert_eq!(err.to_string(), "slug already exists: gitea");

        let store_failure = anyhow::anyhow!("invalid page size in database header");
        assert!(!ValidationError::is_validation(&store_failure));
    }

    #[test]
    fn test_survives_added_context() {
        let result: anyhow::Result<()> = Err(ValidationError::Empty { field: "name" }.into());
        let err = result.context("seeding tools").unwrap_err();
        assert!(ValidationError::is_validation(&err));
    }
}
