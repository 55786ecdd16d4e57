//! Queue Error Types

use crate::queue::QueueKey;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Message queue {key} does not exist")]
    NotFound { key: QueueKey },

    #[error("Message queue {key} was removed")]
    Removed { key: QueueKey },

    #[error("Permission denied for message queue {key}")]
    PermissionDenied { key: QueueKey },

    #[error("Invalid queue key {key}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Invalid message type {message_type} (must be greater than zero)")]
    InvalidMessageType { message_type: i64 },

    #[error("Message of {size} bytes exceeds the maximum of {max_size} bytes")]
    MessageTooLarge { size: usize, max_size: usize },

    #[error("Message waiting on queue {key} exceeds the maximum of {max_size} bytes")]
    OversizedMessage { key: QueueKey, max_size: usize },

    #[error("Operation on message queue {key} was interrupted")]
    Interrupted { key: QueueKey },

    #[error("Task buffer is closed")]
    Closed,

    #[error("{operation} failed for message queue {key}: {source}")]
    Os {
        operation: &'static str,
        key: QueueKey,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
