//! SysV message queue handles
//!
//! Thin wrappers over `msgget`/`msgsnd`/`msgrcv`/`msgctl`. A queue is
//! addressed by a [`QueueKey`] agreed out of band between producers and
//! consumers; the kernel object outlives any process until it is removed.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::Task;
use std::fmt;
use std::io;
use std::str::FromStr;

/// Owner read/write, nothing for group or others
const QUEUE_PERMISSIONS: libc::c_int = 0o600;

/// Stable identifier of a SysV message queue
///
/// `IPC_PRIVATE` (0) is not a valid key here: a private queue cannot be
/// attached by another process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueKey(libc::key_t);

impl QueueKey {
    pub fn new(raw: libc::key_t) -> QueueResult<Self> {
        if raw == libc::IPC_PRIVATE {
            return Err(QueueError::InvalidKey {
                key: raw.to_string(),
                reason: "IPC_PRIVATE cannot be shared between processes".to_string(),
            });
        }
        Ok(Self(raw))
    }

    pub fn raw(&self) -> libc::key_t {
        self.0
    }
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0 as u32)
    }
}

impl FromStr for QueueKey {
    type Err = QueueError;

    /// Accepts decimal (`1234`, `-5`) or hexadecimal (`0x4d2`) keys
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = |reason: String| QueueError::InvalidKey {
            key: trimmed.to_string(),
            reason,
        };

        let raw = if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            u32::from_str_radix(hex, 16)
                .map(|v| v as libc::key_t)
                .map_err(|e| invalid(e.to_string()))?
        } else {
            trimmed
                .parse::<libc::key_t>()
                .map_err(|e| invalid(e.to_string()))?
        };

        Self::new(raw)
    }
}

/// How a handle gets hold of the kernel queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the queue when it does not exist yet (input side)
    CreateIfAbsent,
    /// Only attach to a queue some other process created (output side)
    AttachOnly,
}

/// Handle to a SysV message queue
#[derive(Debug)]
pub struct MessageQueue {
    key: QueueKey,
    id: libc::c_int,
    mode: OpenMode,
    max_message_size: usize,
}

impl MessageQueue {
    /// Linux default for `MSGMAX`
    pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 8192;

    /// Largest message the kernel accepts (`kernel.msgmax`)
    ///
    /// Falls back to `i32::MAX`, the ceiling for `msgmax` itself, when the
    /// sysctl cannot be read.
    pub fn system_max_message_size() -> usize {
        std::fs::read_to_string("/proc/sys/kernel/msgmax")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(i32::MAX as usize)
    }

    /// Create the queue if absent, attach otherwise
    pub fn open_input(key: QueueKey, max_message_size: usize) -> QueueResult<Self> {
        Self::open(key, OpenMode::CreateIfAbsent, max_message_size)
    }

    /// Attach to an existing queue; `QueueError::NotFound` if there is none
    pub fn open_output(key: QueueKey, max_message_size: usize) -> QueueResult<Self> {
        Self::open(key, OpenMode::AttachOnly, max_message_size)
    }

    pub fn open(key: QueueKey, mode: OpenMode, max_message_size: usize) -> QueueResult<Self> {
        let flags = match mode {
            OpenMode::CreateIfAbsent => libc::IPC_CREAT | QUEUE_PERMISSIONS,
            OpenMode::AttachOnly => 0,
        };

        let id = unsafe { libc::msgget(key.raw(), flags) };
        if id < 0 {
            return Err(map_os_error("msgget", key, io::Error::last_os_error()));
        }

        log::debug!("Opened message queue {} (id {}, {:?})", key, id, mode);

        Ok(Self {
            key,
            id,
            mode,
            max_message_size,
        })
    }

    pub fn key(&self) -> QueueKey {
        self.key
    }

    pub fn id(&self) -> libc::c_int {
        self.id
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Send one message, blocking while the queue is full
    pub fn send(&self, message_type: i64, payload: &[u8]) -> QueueResult<()> {
        let mtype = libc::c_long::try_from(message_type)
            .ok()
            .filter(|t| *t > 0)
            .ok_or(QueueError::InvalidMessageType { message_type })?;

        if payload.len() > self.max_message_size {
            return Err(QueueError::MessageTooLarge {
                size: payload.len(),
                max_size: self.max_message_size,
            });
        }

        let mut buffer = MessageBuffer::with_capacity(payload.len());
        buffer.set_message_type(mtype);
        buffer.text_mut()[..payload.len()].copy_from_slice(payload);

        loop {
            let rc = unsafe { libc::msgsnd(self.id, buffer.as_ptr(), payload.len(), 0) };
            if rc == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(map_os_error("msgsnd", self.key, err));
        }
    }

    /// Block until a message of any type arrives (FIFO across types)
    ///
    /// A message longer than `max_message_size` is never truncated: it stays
    /// at the head of the queue and `QueueError::OversizedMessage` is returned
    /// (see [`discard_next`](Self::discard_next)). An interrupted call returns
    /// `QueueError::Interrupted`; a queue removed while waiting returns
    /// `QueueError::Removed`.
    pub fn receive(&self) -> QueueResult<Task> {
        let mut buffer = MessageBuffer::with_capacity(self.max_message_size);

        let received =
            unsafe { libc::msgrcv(self.id, buffer.as_mut_ptr(), self.max_message_size, 0, 0) };
        if received < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::E2BIG) {
                return Err(QueueError::OversizedMessage {
                    key: self.key,
                    max_size: self.max_message_size,
                });
            }
            return Err(map_os_error("msgrcv", self.key, err));
        }

        let len = received as usize;
        Ok(Task::new(
            i64::from(buffer.message_type()),
            buffer.text()[..len].to_vec(),
        ))
    }

    /// Drop the message at the head of the queue without blocking
    ///
    /// Returns its message type, or `None` if the queue is empty. This is how
    /// a receiver gets past a message it refused as oversized.
    pub fn discard_next(&self) -> QueueResult<Option<i64>> {
        let mut buffer = MessageBuffer::with_capacity(0);

        let rc = unsafe {
            libc::msgrcv(
                self.id,
                buffer.as_mut_ptr(),
                0,
                0,
                libc::MSG_NOERROR | libc::IPC_NOWAIT,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ENOMSG) {
                return Ok(None);
            }
            return Err(map_os_error("msgrcv", self.key, err));
        }
        Ok(Some(i64::from(buffer.message_type())))
    }

    /// Number of messages currently waiting in the kernel queue
    pub fn pending(&self) -> QueueResult<usize> {
        let mut stat: libc::msqid_ds = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::msgctl(self.id, libc::IPC_STAT, &mut stat) };
        if rc < 0 {
            return Err(map_os_error("msgctl(IPC_STAT)", self.key, io::Error::last_os_error()));
        }
        Ok(stat.msg_qnum as usize)
    }

    /// Destroy the kernel queue
    ///
    /// Blocked receivers wake up with `QueueError::Removed`. Not idempotent:
    /// removing an already removed queue fails with `QueueError::NotFound`.
    pub fn remove(&self) -> QueueResult<()> {
        let rc = unsafe { libc::msgctl(self.id, libc::IPC_RMID, std::ptr::null_mut()) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::EINVAL) | Some(libc::EIDRM) => QueueError::NotFound { key: self.key },
                _ => map_os_error("msgctl(IPC_RMID)", self.key, err),
            });
        }
        log::debug!("Removed message queue {} (id {})", self.key, self.id);
        Ok(())
    }
}

fn map_os_error(operation: &'static str, key: QueueKey, err: io::Error) -> QueueError {
    match err.raw_os_error() {
        Some(libc::ENOENT) => QueueError::NotFound { key },
        Some(libc::EIDRM) | Some(libc::EINVAL) => QueueError::Removed { key },
        Some(libc::EACCES) | Some(libc::EPERM) => QueueError::PermissionDenied { key },
        Some(libc::EINTR) => QueueError::Interrupted { key },
        _ => QueueError::Os {
            operation,
            key,
            source: err,
        },
    }
}

/// `struct msgbuf` with a variable-length `mtext`
///
/// Backed by `c_long` words so the leading `mtype` is correctly aligned.
struct MessageBuffer {
    words: Vec<libc::c_long>,
}

impl MessageBuffer {
    const WORD: usize = std::mem::size_of::<libc::c_long>();

    fn with_capacity(text_len: usize) -> Self {
        let text_words = text_len.div_ceil(Self::WORD);
        Self {
            words: vec![0; 1 + text_words],
        }
    }

    fn text_capacity(&self) -> usize {
        (self.words.len() - 1) * Self::WORD
    }

    fn message_type(&self) -> libc::c_long {
        self.words[0]
    }

    fn set_message_type(&mut self, mtype: libc::c_long) {
        self.words[0] = mtype;
    }

    fn text(&self) -> &[u8] {
        let capacity = self.text_capacity();
        unsafe { std::slice::from_raw_parts(self.words.as_ptr().add(1) as *const u8, capacity) }
    }

    fn text_mut(&mut self) -> &mut [u8] {
        let capacity = self.text_capacity();
        unsafe {
            std::slice::from_raw_parts_mut(self.words.as_mut_ptr().add(1) as *mut u8, capacity)
        }
    }

    fn as_ptr(&self) -> *const libc::c_void {
        self.words.as_ptr() as *const libc::c_void
    }

    fn as_mut_ptr(&mut self) -> *mut libc::c_void {
        self.words.as_mut_ptr() as *mut libc::c_void
    }
}
