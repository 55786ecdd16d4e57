//! Pluggable task handler and the context handed to it

use crate::checkpoint::{CheckpointResult, CheckpointStore};
use crate::queue::{MessageQueue, QueueError, QueueResult, Task};
use std::sync::Arc;

/// Error type handlers may return
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = Result<(), HandlerError>;

/// Processes one task at a time on a worker thread
///
/// Implemented for any `Fn(&TaskContext, Task) -> HandlerResult` closure.
/// Errors and panics are contained per task by the worker pool.
pub trait TaskHandler: Send + Sync {
    fn handle(&self, ctx: &TaskContext, task: Task) -> HandlerResult;
}

impl<F> TaskHandler for F
where
    F: Fn(&TaskContext, Task) -> HandlerResult + Send + Sync,
{
    fn handle(&self, ctx: &TaskContext, task: Task) -> HandlerResult {
        self(ctx, task)
    }
}

/// Per-worker view of the manager's side-effect channels
#[derive(Debug, Clone)]
pub struct TaskContext {
    worker: usize,
    checkpoints: CheckpointStore,
    output: Option<Arc<MessageQueue>>,
}

impl TaskContext {
    pub fn new(
        worker: usize,
        checkpoints: CheckpointStore,
        output: Option<Arc<MessageQueue>>,
    ) -> Self {
        Self {
            worker,
            checkpoints,
            output,
        }
    }

    /// Pool slot of the worker running the handler
    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Overwrite `<checkpoint dir>/<filename>` with `data`
    pub fn checkpoint(&self, filename: &str, data: impl AsRef<[u8]>) -> CheckpointResult<()> {
        self.checkpoints.checkpoint(filename, data)
    }

    pub fn output_queue(&self) -> Option<&MessageQueue> {
        self.output.as_deref()
    }

    /// Send a message to the output queue
    pub fn send_output(&self, message_type: i64, payload: &[u8]) -> QueueResult<()> {
        match &self.output {
            Some(queue) => queue.send(message_type, payload),
            None => Err(QueueError::OperationFailed {
                message: "no output queue configured".to_string(),
            }),
        }
    }
}
