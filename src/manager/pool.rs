//! Fixed-size worker pool
//!
//! N threads, fixed at construction, each looping on the shared task buffer.
//! Every handler call runs inside a failure boundary: an error or a panic is
//! logged and counted, and the worker moves on to the next task.

use crate::checkpoint::CheckpointStore;
use crate::manager::handler::{TaskContext, TaskHandler};
use crate::queue::{MessageQueue, TaskBuffer};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Live counters shared by all workers
#[derive(Debug, Default)]
pub struct PoolStats {
    dequeued: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

impl PoolStats {
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            dequeued: self.dequeued.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            panicked: self.panicked.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time copy of [`PoolStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatsSnapshot {
    /// Tasks taken off the buffer
    pub dequeued: u64,
    /// Handler returned `Ok`
    pub succeeded: u64,
    /// Handler returned `Err`
    pub failed: u64,
    /// Handler panicked
    pub panicked: u64,
}

impl PoolStatsSnapshot {
    /// Tasks whose handler call has finished, one way or another
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed + self.panicked
    }
}

pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    size: usize,
    stats: Arc<PoolStats>,
}

impl WorkerPool {
    /// Start `size` workers on `buffer`
    ///
    /// If a thread cannot be started, the buffer is closed, the workers
    /// already running are joined and the spawn error is returned.
    pub fn spawn(
        size: usize,
        buffer: Arc<TaskBuffer>,
        handler: Arc<dyn TaskHandler>,
        checkpoints: CheckpointStore,
        output: Option<Arc<MessageQueue>>,
    ) -> std::io::Result<Self> {
        let stats = Arc::new(PoolStats::default());
        let mut workers = Vec::with_capacity(size);

        for slot in 0..size {
            let ctx = TaskContext::new(slot, checkpoints.clone(), output.clone());
            let buffer_ref = Arc::clone(&buffer);
            let handler = Arc::clone(&handler);
            let worker_stats = Arc::clone(&stats);

            let spawned = std::thread::Builder::new()
                .name(format!("worker-{}", slot))
                .spawn(move || worker_loop(ctx, buffer_ref, handler, worker_stats));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    log::error!("Failed to start worker {}: {}", slot, e);
                    let _ = buffer.close();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(e);
                }
            }
        }

        log::debug!("Started {} worker(s)", size);

        Ok(Self {
            workers,
            size,
            stats,
        })
    }

    /// Number of workers the pool was created with
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }

    /// Wait for every worker to exit
    ///
    /// Workers only exit once the buffer is closed and drained, so close it first.
    pub fn join(&mut self) -> PoolStatsSnapshot {
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                log::error!("{} terminated abnormally", name);
            }
        }
        self.stats.snapshot()
    }
}

fn worker_loop(
    ctx: TaskContext,
    buffer: Arc<TaskBuffer>,
    handler: Arc<dyn TaskHandler>,
    stats: Arc<PoolStats>,
) {
    loop {
        let task = match buffer.pop() {
            Ok(Some(task)) => task,
            Ok(None) => break,
            Err(e) => {
                log::error!("Worker {} cannot read the task buffer: {}", ctx.worker(), e);
                break;
            }
        };

        stats.dequeued.fetch_add(1, Ordering::AcqRel);
        let sequence = task.sequence();

        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&ctx, task))) {
            Ok(Ok(())) => {
                stats.succeeded.fetch_add(1, Ordering::AcqRel);
            }
            Ok(Err(e)) => {
                stats.failed.fetch_add(1, Ordering::AcqRel);
                log::error!(
                    "Worker {}: task {} failed: {}",
                    ctx.worker(),
                    sequence,
                    e
                );
            }
            Err(payload) => {
                stats.panicked.fetch_add(1, Ordering::AcqRel);
                log::error!(
                    "Worker {}: task {} panicked: {}",
                    ctx.worker(),
                    sequence,
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    log::debug!("Worker {} exiting", ctx.worker());
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
