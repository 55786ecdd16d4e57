//! Queue-backed worker-pool manager
//!
//! A [`Manager`] owns one input queue (created if absent), an optional output
//! queue (which must already exist), an internal task buffer and a fixed pool
//! of worker threads running a caller-supplied [`TaskHandler`].
//!
//! ```text
//! Manager::new      checkpoint dir → logging → input queue → output queue
//!                   → signal watcher → workers
//! Manager::listen   input queue ──▶ TaskBuffer   (until shutdown)
//! Manager::shutdown close buffer → workers drain → join → signal watcher stops
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ipc_dispatch::manager::{HandlerResult, Manager, ManagerConfig, TaskContext};
//! use ipc_dispatch::queue::Task;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ManagerConfig::new("Variant Calling")
//!     .with_input_queue("0x4d2".parse()?)
//!     .with_workers(8);
//!
//! let manager = Manager::new(config, |ctx: &TaskContext, task: Task| -> HandlerResult {
//!     ctx.checkpoint(&format!("task-{}", task.sequence()), &task.payload)?;
//!     Ok(())
//! })?;
//!
//! // Blocks until SIGINT/SIGTERM, then drains buffered tasks
//! let stats = manager.run()?;
//! println!("processed {} task(s)", stats.completed());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod handler;
mod pool;

pub use config::{ManagerConfig, APP_DIR};
pub use error::{ManagerError, ManagerResult};
pub use handler::{HandlerError, HandlerResult, TaskContext, TaskHandler};
pub use pool::{PoolStats, PoolStatsSnapshot, WorkerPool};

use crate::checkpoint::{CheckpointResult, CheckpointStore};
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::queue::{MessageQueue, QueueError, TaskBuffer};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Requests shutdown of a [`Manager`] from any thread
///
/// Requesting shutdown sets the shared flag and removes the input queue,
/// exactly once, which wakes the blocked listen loop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    coordinator: ShutdownCoordinator,
    input: Arc<MessageQueue>,
    input_removed: Arc<AtomicBool>,
}

impl ShutdownHandle {
    fn new(coordinator: ShutdownCoordinator, input: Arc<MessageQueue>) -> Self {
        Self {
            coordinator,
            input,
            input_removed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn request(&self) {
        if self.coordinator.trigger_shutdown() {
            log::info!("Shutdown requested");
        }
        self.remove_input_queue();
    }

    pub fn is_requested(&self) -> bool {
        self.coordinator.is_shutdown_requested()
    }

    /// Mark draining as finished; a later signal no longer concerns this manager
    fn complete(&self) {
        self.coordinator.complete();
    }

    fn remove_input_queue(&self) {
        if self.input_removed.swap(true, Ordering::AcqRel) {
            return;
        }
        match self.input.remove() {
            Ok(()) => log::info!("Removed input queue {}", self.input.key()),
            Err(e) => log::warn!("Failed to remove input queue {}: {}", self.input.key(), e),
        }
    }
}

pub struct Manager {
    name: String,
    checkpoints: CheckpointStore,
    input: Arc<MessageQueue>,
    output: Option<Arc<MessageQueue>>,
    buffer: Arc<TaskBuffer>,
    pool: WorkerPool,
    shutdown: ShutdownHandle,
    signal_watcher: Option<JoinHandle<()>>,
    next_sequence: AtomicU64,
}

impl Manager {
    /// Build a manager and start its workers
    ///
    /// Fails before any worker starts on a configuration error (missing input
    /// queue key, missing output queue), on a checkpoint directory that cannot
    /// be created, or when logging or the queues cannot be set up.
    pub fn new<H>(config: ManagerConfig, handler: H) -> ManagerResult<Self>
    where
        H: TaskHandler + 'static,
    {
        let input_key = config.validate()?;

        let checkpoint_dir = config.checkpoint_dir()?;
        let checkpoints = CheckpointStore::create(&checkpoint_dir).map_err(|source| {
            ManagerError::CheckpointDirectory {
                path: checkpoint_dir.clone(),
                source,
            }
        })?;

        init_logging(
            config.log_level,
            config.log_format,
            config.log_path.as_deref(),
            config.color,
        )
        .map_err(|e| ManagerError::Logging {
            message: e.to_string(),
        })?;

        log::info!(
            "Starting manager '{}' (checkpoints in {})",
            config.name,
            checkpoint_dir.display()
        );

        log::info!("Opening input queue with key {}", input_key);
        let input = Arc::new(MessageQueue::open_input(
            input_key,
            config.max_message_size,
        )?);

        let output = match config.output_queue {
            Some(key) => {
                log::info!("Opening output queue with key {}", key);
                match MessageQueue::open_output(key, config.max_message_size) {
                    Ok(queue) => Some(Arc::new(queue)),
                    Err(QueueError::NotFound { .. }) => {
                        return Err(ManagerError::configuration(format!(
                            "Cannot find output queue {}, exiting",
                            key
                        )));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => None,
        };

        let coordinator = ShutdownCoordinator::new();
        let shutdown = ShutdownHandle::new(coordinator.clone(), Arc::clone(&input));

        let signal_watcher = if config.handle_signals {
            let on_signal = shutdown.clone();
            let watcher = coordinator
                .spawn_signal_watcher(move || on_signal.request())
                .map_err(|source| ManagerError::Spawn {
                    what: "signal watcher",
                    source,
                })?;
            Some(watcher)
        } else {
            None
        };

        if config.num_workers == 0 {
            log::warn!(
                "Manager '{}' has no workers; received tasks will only accumulate",
                config.name
            );
        }

        // Nothing would ever make room in a full buffer
        let capacity = match config.buffer_capacity {
            Some(capacity) if config.num_workers == 0 => {
                log::warn!("Ignoring buffer capacity {} without workers", capacity);
                None
            }
            capacity => capacity,
        };
        let buffer = Arc::new(TaskBuffer::new(capacity));
        let pool = match WorkerPool::spawn(
            config.num_workers,
            Arc::clone(&buffer),
            Arc::new(handler),
            checkpoints.clone(),
            output.clone(),
        ) {
            Ok(pool) => pool,
            Err(source) => {
                // The watcher must not remove the queue of a manager that never existed
                shutdown.complete();
                join_signal_watcher(signal_watcher);
                return Err(ManagerError::Spawn {
                    what: "worker thread",
                    source,
                });
            }
        };

        Ok(Self {
            name: config.name,
            checkpoints,
            input,
            output,
            buffer,
            pool,
            shutdown,
            signal_watcher,
            next_sequence: AtomicU64::new(1),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checkpoint_dir(&self) -> &Path {
        self.checkpoints.dir()
    }

    /// Overwrite `<checkpoint dir>/<filename>` with `data`
    pub fn checkpoint(&self, filename: &str, data: impl AsRef<[u8]>) -> CheckpointResult<()> {
        self.checkpoints.checkpoint(filename, data)
    }

    pub fn input_queue(&self) -> &MessageQueue {
        &self.input
    }

    pub fn output_queue(&self) -> Option<&MessageQueue> {
        self.output.as_deref()
    }

    pub fn num_workers(&self) -> usize {
        self.pool.size()
    }

    /// Tasks received but not yet picked up by a worker
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.pool.stats()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Move messages from the input queue into the task buffer
    ///
    /// Blocks until shutdown is requested (signal or [`ShutdownHandle`]).
    /// Messages larger than the configured maximum are discarded with a warning
    /// rather than handed on truncated.
    /// Returns an error if the input queue disappears without a shutdown
    /// request or a receive fails for another reason.
    pub fn listen(&self) -> ManagerResult<()> {
        log::info!("Start listen on input queue {}", self.input.key());

        while !self.shutdown.is_requested() {
            match self.input.receive() {
                Ok(mut task) => {
                    task.header.sequence = self.next_sequence.fetch_add(1, Ordering::AcqRel);
                    log::debug!(
                        "Received task {} (type {}, {} bytes)",
                        task.sequence(),
                        task.message_type(),
                        task.payload.len()
                    );
                    match self.buffer.push(task) {
                        Ok(()) => {}
                        Err(QueueError::Closed) => {
                            log::info!("Task buffer closed, stopping listen loop");
                            return Ok(());
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                Err(QueueError::Interrupted { .. }) => continue,
                Err(QueueError::OversizedMessage { max_size, .. }) => {
                    match self.input.discard_next()? {
                        Some(message_type) => log::warn!(
                            "Discarded message of type {} on {}: larger than {} bytes",
                            message_type,
                            self.input.key(),
                            max_size
                        ),
                        None => log::debug!("Oversized message was taken by another receiver"),
                    }
                }
                Err(QueueError::Removed { .. }) | Err(QueueError::NotFound { .. })
                    if self.shutdown.is_requested() =>
                {
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        log::info!("Listen loop stopped");
        Ok(())
    }

    /// Stop accepting work and wait for the workers
    ///
    /// Requests shutdown if nobody has yet, so the input queue is removed.
    /// Tasks already buffered are still handed to the workers and in-flight
    /// handler calls finish; with no workers they are discarded.
    pub fn shutdown(mut self) -> ManagerResult<PoolStatsSnapshot> {
        self.shutdown.request();
        self.buffer.close()?;

        if self.pool.size() == 0 {
            let discarded = self.buffer.drain()?;
            if !discarded.is_empty() {
                log::warn!(
                    "Discarding {} buffered task(s): manager has no workers",
                    discarded.len()
                );
            }
        } else {
            log::info!(
                "Waiting for {} worker(s) to finish {} buffered task(s)",
                self.pool.size(),
                self.buffer.len()
            );
        }

        let stats = self.pool.join();
        self.shutdown.complete();
        join_signal_watcher(self.signal_watcher.take());
        log::info!(
            "Manager '{}' stopped: {} task(s) handled, {} failed, {} panicked",
            self.name,
            stats.completed(),
            stats.failed,
            stats.panicked
        );
        Ok(stats)
    }

    /// [`listen`](Self::listen) until shutdown, then [`shutdown`](Self::shutdown)
    pub fn run(self) -> ManagerResult<PoolStatsSnapshot> {
        let listened = self.listen();
        let stats = self.shutdown()?;
        listened.map(|_| stats)
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        // Let idle workers exit; the input queue is left in place
        let _ = self.buffer.close();
        self.shutdown.complete();
        join_signal_watcher(self.signal_watcher.take());
    }
}

fn join_signal_watcher(watcher: Option<JoinHandle<()>>) {
    if let Some(handle) = watcher {
        if handle.join().is_err() {
            log::error!("signal-watcher terminated abnormally");
        }
    }
}
