//! Queue Components
//!
//! The two kinds of queue a dispatcher deals with:
//!
//! - **SysV message queues** ([`MessageQueue`]): kernel objects shared with
//!   other processes, addressed by a [`QueueKey`]. The input queue is created
//!   if absent; the output queue must already exist.
//! - **The internal task buffer** ([`TaskBuffer`]): an in-process FIFO that
//!   decouples the blocking receive from the worker pool.
//!
//! ```text
//! producer ──msgsnd──▶ ┌─────────────┐  listen loop  ┌────────────┐  pop  ┌──────────┐
//!                      │ input queue │ ────────────▶ │ TaskBuffer │ ────▶ │ worker N │
//!                      └─────────────┘    push       └────────────┘       └──────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ipc_dispatch::queue::{MessageQueue, QueueKey, TaskBuffer};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key: QueueKey = "0x4d2".parse()?;
//! let input = MessageQueue::open_input(key, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE)?;
//! input.send(1, b"sample-01")?;
//!
//! let buffer = TaskBuffer::unbounded();
//! buffer.push(input.receive()?)?;
//! assert_eq!(buffer.pop()?.map(|t| t.payload), Some(b"sample-01".to_vec()));
//! input.remove()?;
//! # Ok(())
//! # }
//! ```

mod buffer;
mod error;
mod ipc;
mod message;

pub use buffer::TaskBuffer;
pub use error::{QueueError, QueueResult};
pub use ipc::{MessageQueue, OpenMode, QueueKey};
pub use message::{Task, TaskHeader};

#[cfg(test)]
mod tests;
