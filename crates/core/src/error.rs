//! Errors raised by the pure freezer rules.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic rule failures. Storage and transport errors live in the
/// infra and api crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bad input: blank names, unknown enum values, out-of-range numbers.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A rule about existing state was broken, e.g. a container that is not active.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An id that is not a positive integer.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique key clash (container code, item code).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_resource() {
        assert_eq!(DomainError::not_found("meal set").to_string(), "meal set not found");
    }

    #[test]
    fn constructors_wrap_messages() {
        assert_eq!(
            DomainError::validation("name cannot be empty"),
            DomainError::Validation("name cannot be empty".to_string())
        );
        assert_eq!(
            DomainError::conflict("duplicate").to_string(),
            "conflict: duplicate"
        );
    }
}
