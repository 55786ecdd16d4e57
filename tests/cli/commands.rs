//! `send`, `remove` and `run` end to end

use super::{ipc_dispatch, stderr, terminate};
use crate::common::{cleanup_queue, unique_key, wait_until};
use ipc_dispatch::queue::{MessageQueue, QueueError};
use std::time::Duration;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(10);

#[test]
fn test_send_then_remove() {
    let home = TempDir::new().unwrap();
    let key = unique_key();
    let queue = MessageQueue::open_input(key, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE).unwrap();

    let output = ipc_dispatch(home.path())
        .args(["send", "--queue", &key.to_string(), "--type", "4", "hello"])
        .output()
        .unwrap();
    assert!(output.status.success(), "send failed: {}", stderr(&output));

    let task = queue.receive().unwrap();
    assert_eq!(task.message_type(), 4);
    assert_eq!(task.payload, b"hello".to_vec());

    let output = ipc_dispatch(home.path())
        .args(["remove", "--queue", &key.to_string()])
        .output()
        .unwrap();
    assert!(output.status.success(), "remove failed: {}", stderr(&output));

    let reopened = MessageQueue::open_output(key, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE);
    assert!(matches!(reopened, Err(QueueError::NotFound { .. })));
}

#[test]
fn test_send_to_missing_queue_fails() {
    let home = TempDir::new().unwrap();
    let key = unique_key();
    cleanup_queue(key);

    let output = ipc_dispatch(home.path())
        .args(["send", "--queue", &key.to_string(), "data"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("FATAL: Cannot find queue"));
}

#[test]
fn test_send_rejects_non_positive_type() {
    let home = TempDir::new().unwrap();
    let key = unique_key();
    let queue = MessageQueue::open_input(key, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE).unwrap();

    let output = ipc_dispatch(home.path())
        .args(["send", "--queue", &key.to_string(), "--type", "0", "data"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(queue.pending().unwrap(), 0);
    queue.remove().unwrap();
}

#[test]
fn test_run_requires_input_queue() {
    let home = TempDir::new().unwrap();

    let output = ipc_dispatch(home.path()).arg("run").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("ID for the input queue must be specified"));
}

#[test]
fn test_run_with_missing_output_queue_fails() {
    let home = TempDir::new().unwrap();
    let input = unique_key();
    let output_key = unique_key();
    cleanup_queue(output_key);

    let output = ipc_dispatch(home.path())
        .args([
            "run",
            "--input-queue",
            &input.to_string(),
            "--output-queue",
            &output_key.to_string(),
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Cannot find output queue"));
    cleanup_queue(input);
}

#[test]
fn test_run_processes_and_forwards_until_sigterm() {
    let home = TempDir::new().unwrap();
    let input = unique_key();
    let output_key = unique_key();
    let output = MessageQueue::open_input(output_key, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE).unwrap();

    let mut child = ipc_dispatch(home.path())
        .args([
            "run",
            "--name",
            "E2E Run",
            "--input-queue",
            &input.to_string(),
            "--output-queue",
            &output_key.to_string(),
            "--workers",
            "2",
        ])
        .spawn()
        .unwrap();

    let mut sender = None;
    assert!(wait_until(WAIT, || {
        sender = MessageQueue::open_output(input, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE).ok();
        sender.is_some()
    }));
    let sender = sender.unwrap();

    for n in 0..6 {
        sender.send(1, format!("item-{}", n).as_bytes()).unwrap();
    }

    let mut forwarded: Vec<Vec<u8>> = (0..6).map(|_| output.receive().unwrap().payload).collect();
    forwarded.sort();
    let expected: Vec<Vec<u8>> = (0..6).map(|n| format!("item-{}", n).into_bytes()).collect();
    assert_eq!(forwarded, expected);

    let checkpoint_dir = home.path().join(".ipc-dispatch/checkpoints/e2e-run");
    assert!(wait_until(WAIT, || {
        std::fs::read_dir(&checkpoint_dir)
            .map(|entries| entries.count() > 0)
            .unwrap_or(false)
    }));

    terminate(&child);
    let status = child.wait().unwrap();
    assert!(status.success(), "run exited with {:?}", status);

    let reopened = MessageQueue::open_output(input, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE);
    assert!(matches!(reopened, Err(QueueError::NotFound { .. })));
    output.remove().unwrap();
}
