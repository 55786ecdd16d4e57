//! Configuration file discovery, precedence and errors

use super::{ipc_dispatch, stderr, terminate};
use crate::common::{unique_key, wait_until};
use ipc_dispatch::queue::MessageQueue;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_missing_named_config_file_fails() {
    let home = TempDir::new().unwrap();

    let output = ipc_dispatch(home.path())
        .args(["--config-file", "/nonexistent/ipc-dispatch.toml", "run"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("does not exist"));
}

#[test]
fn test_invalid_config_value_fails() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bad.toml");
    std::fs::write(&config, "workers = \"lots\"\n").unwrap();

    let output = ipc_dispatch(home.path())
        .arg("--config-file")
        .arg(&config)
        .arg("run")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("'workers' must be an integer"));
}

#[test]
fn test_default_config_file_configures_run() {
    let home = TempDir::new().unwrap();
    let input = unique_key();
    let checkpoint_root = home.path().join("checkpoints");

    let config_dir = home.path().join(".config").join("ipc-dispatch");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("ipc-dispatch.toml"),
        format!(
            "name = \"From Config\"\ninput-queue = \"{}\"\nworkers = 1\ncheckpoint-root = \"{}\"\n",
            input,
            checkpoint_root.display()
        ),
    )
    .unwrap();

    let mut child = ipc_dispatch(home.path()).arg("run").spawn().unwrap();

    let mut sender = None;
    assert!(wait_until(Duration::from_secs(10), || {
        sender = MessageQueue::open_output(input, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE).ok();
        sender.is_some()
    }));
    sender.unwrap().send(2, b"configured").unwrap();

    let checkpoint = checkpoint_root.join("from-config").join("worker-0.json");
    assert!(wait_until(Duration::from_secs(10), || checkpoint.exists()));

    terminate(&child);
    assert!(child.wait().unwrap().success());

    let record: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&checkpoint).unwrap()).unwrap();
    assert_eq!(record["message_type"], 2);
    assert_eq!(record["bytes"], 10);
    assert_eq!(record["sequence"], 1);
}
