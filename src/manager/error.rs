//! Manager Error Types

use crate::checkpoint::CheckpointError;
use crate::core::error_handling::ContextualError;
use crate::queue::QueueError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to create checkpoint directory {path}: {source}")]
    CheckpointDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to initialise logging: {message}")]
    Logging { message: String },

    #[error("Failed to spawn {what}: {source}")]
    Spawn {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl ManagerError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ManagerError::Configuration {
            message: message.into(),
        }
    }

    /// Startup problems the operator fixes by changing configuration
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ManagerError::Configuration { .. })
    }
}

impl ContextualError for ManagerError {
    fn is_user_actionable(&self) -> bool {
        self.is_configuration_error()
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ManagerError::Configuration { message } => Some(message),
            _ => None,
        }
    }
}

/// Result type for manager operations
pub type ManagerResult<T> = Result<T, ManagerError>;
