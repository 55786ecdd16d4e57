//! Internal task buffer between the listen loop and the worker pool
//!
//! A FIFO protected by a mutex, with one condition variable for consumers
//! waiting on an empty buffer and one for a producer waiting on a full one.
//! Unbounded unless a capacity is given.

use crate::core::sync::handle_mutex_poison;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::Task;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct BufferState {
    tasks: VecDeque<Task>,
    closed: bool,
}

/// Blocking multi-consumer FIFO of tasks
#[derive(Debug)]
pub struct TaskBuffer {
    state: Mutex<BufferState>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<usize>,
}

impl TaskBuffer {
    /// Buffer with no capacity bound
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Buffer whose `push` blocks while `capacity` tasks are waiting
    ///
    /// A capacity of 0 is treated as 1.
    pub fn bounded(capacity: usize) -> Self {
        Self::new(Some(capacity.max(1)))
    }

    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(BufferState::default()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn lock(&self) -> QueueResult<MutexGuard<'_, BufferState>> {
        handle_mutex_poison(self.state.lock(), |message| QueueError::OperationFailed {
            message,
        })
    }

    fn is_full(&self, state: &BufferState) -> bool {
        self.capacity
            .is_some_and(|capacity| state.tasks.len() >= capacity)
    }

    /// Append a task, blocking while a bounded buffer is full
    ///
    /// Fails with `QueueError::Closed` once the buffer has been closed.
    pub fn push(&self, task: Task) -> QueueResult<()> {
        let mut state = self.lock()?;
        while !state.closed && self.is_full(&state) {
            state = handle_mutex_poison(self.not_full.wait(state), |message| {
                QueueError::OperationFailed { message }
            })?;
        }
        if state.closed {
            return Err(QueueError::Closed);
        }
        state.tasks.push_back(task);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Take the oldest task, blocking while the buffer is empty
    ///
    /// Returns `None` only when the buffer is closed and fully drained.
    pub fn pop(&self) -> QueueResult<Option<Task>> {
        let mut state = self.lock()?;
        loop {
            if let Some(task) = state.tasks.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Ok(Some(task));
            }
            if state.closed {
                return Ok(None);
            }
            state = handle_mutex_poison(self.not_empty.wait(state), |message| {
                QueueError::OperationFailed { message }
            })?;
        }
    }

    /// Stop accepting tasks and wake every waiter
    pub fn close(&self) -> QueueResult<()> {
        let mut state = self.lock()?;
        state.closed = true;
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.lock().map(|state| state.closed).unwrap_or(true)
    }

    /// Number of tasks waiting for a worker
    pub fn len(&self) -> usize {
        self.lock().map(|state| state.tasks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every waiting task
    pub fn drain(&self) -> QueueResult<Vec<Task>> {
        let mut state = self.lock()?;
        let tasks: Vec<Task> = state.tasks.drain(..).collect();
        drop(state);
        self.not_full.notify_all();
        Ok(tasks)
    }
}

impl Default for TaskBuffer {
    fn default() -> Self {
        Self::unbounded()
    }
}
