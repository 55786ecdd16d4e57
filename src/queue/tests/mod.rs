//! Test modules for the queue components
//!
//! Tests are organized by component. IPC tests create real SysV queues under
//! keys unique to this process and remove them when done.


use crate::queue::QueueKey;
use std::sync::atomic::{AtomicI32, Ordering};

static NEXT_KEY: AtomicI32 = AtomicI32::new(1);

/// A key no other test (or concurrently running test binary) will use
pub(crate) fn unique_key() -> QueueKey {
    let pid = (std::process::id() & 0x7fff) as i32;
    let n = NEXT_KEY.fetch_add(1, Ordering::Relaxed) & 0xff;
    QueueKey::new(0x3100_0000 | (pid << 8) | n).expect("non-zero key")
}
