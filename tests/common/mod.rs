//! Common test utilities and helpers
//!
//! Integration tests create real SysV message queues. Keys are derived from
//! the process id so concurrently running test binaries never collide, and
//! every test removes what it created.

#![allow(dead_code)]

use ipc_dispatch::manager::ManagerConfig;
use ipc_dispatch::queue::{MessageQueue, QueueKey};
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, Instant};

static NEXT_KEY: AtomicI32 = AtomicI32::new(1);

/// A queue key unique to this test process
pub fn unique_key() -> QueueKey {
    let pid = (std::process::id() & 0x7fff) as i32;
    let n = NEXT_KEY.fetch_add(1, Ordering::Relaxed) & 0xff;
    QueueKey::new(0x3200_0000 | (pid << 8) | n).unwrap()
}

/// Manager configuration for tests: checkpoints under `root`, no signal handling
pub fn test_config(name: &str, input: QueueKey, root: &Path) -> ManagerConfig {
    ManagerConfig::new(name)
        .with_input_queue(input)
        .with_checkpoint_root(root)
        .with_signal_handling(false)
}

/// Remove a queue if it still exists
pub fn cleanup_queue(key: QueueKey) {
    if let Ok(queue) = MessageQueue::open_output(key, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE) {
        let _ = queue.remove();
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}
