//! Signal-driven shutdown
//!
//! Kept in its own test binary: raising SIGTERM affects the whole process.

mod common;

use common::{unique_key, wait_until};
use ipc_dispatch::manager::{HandlerResult, Manager, ManagerConfig, TaskContext};
use ipc_dispatch::queue::{MessageQueue, QueueError, Task};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_sigterm_removes_input_queue_and_drains() {
    let root = TempDir::new().unwrap();
    let key = unique_key();
    let handled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&handled);

    let config = ManagerConfig::new("signalled")
        .with_input_queue(key)
        .with_checkpoint_root(root.path())
        .with_workers(1);
    assert!(config.handle_signals);

    let manager = Manager::new(config, move |_: &TaskContext, _: Task| -> HandlerResult {
        std::thread::sleep(Duration::from_millis(10));
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    let sender = MessageQueue::open_output(key, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE).unwrap();
    let shutdown = manager.shutdown_handle();
    let runner = std::thread::spawn(move || manager.run());

    for n in 0..5 {
        sender.send(1, format!("{}", n).as_bytes()).unwrap();
    }
    assert!(wait_until(Duration::from_secs(10), || sender.pending().unwrap_or(0) == 0));

    unsafe {
        libc::raise(libc::SIGTERM);
    }

    let stats = runner.join().unwrap().unwrap();
    assert!(shutdown.is_requested());
    assert_eq!(stats.succeeded, 5);
    assert_eq!(handled.load(Ordering::SeqCst), 5);

    let reopened = MessageQueue::open_output(key, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE);
    assert!(matches!(reopened, Err(QueueError::NotFound { .. })));
}
