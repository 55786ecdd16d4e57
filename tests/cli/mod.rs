//! CLI Integration Test Modules

pub mod commands;
pub mod config_file;

use std::path::Path;
use std::process::{Command, Output};

/// Command for the binary with an isolated home and configuration directory
pub fn ipc_dispatch(home: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ipc-dispatch"));
    command
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .arg("--no-color");
    command
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Send SIGTERM to a child process
pub fn terminate(child: &std::process::Child) {
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGTERM) };
    assert_eq!(rc, 0, "failed to signal child {}", child.id());
}
