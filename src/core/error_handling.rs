//! Generic error handling utilities
//!
//! Provides unified fatal-error reporting that works across the error types of
//! the queue, checkpoint and manager modules.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// User-actionable errors (a missing queue key, an output queue that does not
/// exist, a bad configuration value) show their own message. System errors
/// (I/O failures, failed system calls) show the operation context, with the
/// full error available at debug level.
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)`; otherwise it should return `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the operator can act on directly
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// # Examples
/// ```rust,no_run
/// # use ipc_dispatch::core::error_handling::log_error_with_context;
/// # use ipc_dispatch::manager::ManagerError;
/// let err = ManagerError::Configuration {
///     message: "ID for the input queue must be specified".to_string(),
/// };
/// log_error_with_context(&err, "Manager startup");
/// // Logs: "FATAL: ID for the input queue must be specified"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    if error.is_user_actionable() {
        if let Some(user_msg) = error.user_message() {
            log::error!("FATAL: {}", user_msg);
        } else {
            log::error!("FATAL: {}", operation_context);
        }
    } else {
        log::error!("FATAL: {}: {}", operation_context, error);
    }
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::ValidationError;
    use crate::manager::ManagerError;
    use crate::queue::{QueueError, QueueKey};

    #[test]
    fn test_configuration_error_shows_its_own_message() {
        let error = ManagerError::configuration("Cannot find output queue 0x000004d3, exiting");

        assert!(error.is_user_actionable());
        assert_eq!(
            error.user_message(),
            Some("Cannot find output queue 0x000004d3, exiting")
        );
        log_error_with_context(&error, "Manager startup");
    }

    #[test]
    fn test_queue_failure_is_a_system_error() {
        let key = QueueKey::new(0x4d2).unwrap();
        let error = ManagerError::from(QueueError::Os {
            operation: "msgget",
            key,
            source: std::io::Error::from_raw_os_error(libc::ENOSPC),
        });

        assert!(!error.is_user_actionable());
        assert_eq!(error.user_message(), None);
        log_error_with_context(&error, "Opening input queue");
    }

    #[test]
    fn test_validation_error_is_user_actionable() {
        let error = ValidationError::new("'workers' must be an integer, got string");

        assert!(error.is_user_actionable());
        assert!(error.user_message().unwrap().contains("workers"));
        log_error_with_context(&error, "Loading configuration");
    }
}
