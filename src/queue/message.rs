//! Task type carried from the input queue to the workers
//!
//! A task is exactly what a producer put on the input queue: a SysV message
//! type and an opaque payload. The header adds receive-side metadata without
//! touching either.

use std::time::SystemTime;

/// Header information attached when a task is received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHeader {
    /// Monotonic sequence number assigned by the listen loop, starting at 1
    pub sequence: u64,
    /// Timestamp when the task was taken off the input queue
    pub received_at: SystemTime,
    /// Message type (SysV `mtype`) chosen by the producer
    pub message_type: i64,
}

/// One unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub header: TaskHeader,
    pub payload: Vec<u8>,
}

impl Task {
    pub fn new(message_type: i64, payload: Vec<u8>) -> Self {
        Self {
            header: TaskHeader {
                sequence: 0, // Set by the listen loop
                received_at: SystemTime::now(),
                message_type,
            },
            payload,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.header.sequence
    }

    pub fn message_type(&self) -> i64 {
        self.header.message_type
    }

    /// Payload as UTF-8 text, if it is valid UTF-8
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
