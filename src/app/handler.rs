//! Built-in task handler used by `ipc-dispatch run`
//!
//! Logs each task, forwards it unchanged to the output queue when one is
//! configured, and records the last task each worker processed in
//! `worker-<slot>.json` in the checkpoint directory.

use crate::manager::{HandlerResult, TaskContext, TaskHandler};
use crate::queue::Task;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Contents of a worker's checkpoint file
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckpointRecord {
    pub sequence: u64,
    pub message_type: i64,
    pub bytes: usize,
    pub worker: usize,
    pub forwarded: bool,
    pub processed_at: DateTime<Utc>,
}

impl CheckpointRecord {
    pub fn new(task: &Task, worker: usize, forwarded: bool) -> Self {
        Self {
            sequence: task.sequence(),
            message_type: task.message_type(),
            bytes: task.payload.len(),
            worker,
            forwarded,
            processed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ForwardingHandler;

impl ForwardingHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn checkpoint_filename(worker: usize) -> String {
        format!("worker-{}.json", worker)
    }
}

impl TaskHandler for ForwardingHandler {
    fn handle(&self, ctx: &TaskContext, task: Task) -> HandlerResult {
        log::info!(
            "Worker {}: task {} (type {}): {}",
            ctx.worker(),
            task.sequence(),
            task.message_type(),
            task.payload_str().unwrap_or("<binary payload>")
        );

        let forwarded = match ctx.output_queue() {
            Some(output) => {
                output.send(task.message_type(), &task.payload)?;
                log::debug!("Forwarded task {} to {}", task.sequence(), output.key());
                true
            }
            None => false,
        };

        let record = CheckpointRecord::new(&task, ctx.worker(), forwarded);
        let json = serde_json::to_vec_pretty(&record)?;
        ctx.checkpoint(&Self::checkpoint_filename(ctx.worker()), json)?;
        Ok(())
    }
}
