//! Validation of command-line and configuration-file values

use crate::core::error_handling::ContextualError;

/// A value supplied by the operator that cannot be used
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Validate a value that must be a non-negative integer that fits in `usize`
pub fn validate_count(key: &str, value: i64) -> Result<usize, ValidationError> {
    usize::try_from(value).map_err(|_| {
        ValidationError::new(&format!(
            "'{}' must be a non-negative integer, got {}",
            key, value
        ))
    })
}

/// Validate a value that must be strictly positive
pub fn validate_positive(key: &str, value: i64) -> Result<usize, ValidationError> {
    match validate_count(key, value)? {
        0 => Err(ValidationError::new(&format!(
            "'{}' must be greater than 0",
            key
        ))),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_user_actionable() {
        let err = ValidationError::new("bad value");
        assert!(err.is_user_actionable());
        assert_eq!(err.user_message(), Some("bad value"));
        assert_eq!(err.to_string(), "bad value");
    }

    #[test]
    fn test_validate_count() {
        assert_eq!(validate_count("workers", 0), Ok(0));
        assert_eq!(validate_count("workers", 12), Ok(12));

        let err = validate_count("workers", -1).unwrap_err();
        assert!(err.message().contains("workers"));
    }

    #[test]
    fn test_validate_positive() {
        assert_eq!(validate_positive("max-message-size", 1), Ok(1));
        assert!(validate_positive("max-message-size", 0).is_err());
        assert!(validate_positive("max-message-size", -4).is_err());
    }
}
