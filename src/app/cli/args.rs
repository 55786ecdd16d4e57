//! Command-line arguments
//!
//! Global flags (configuration file, logging, color) apply to every
//! subcommand. Values left unset here may be filled from the configuration
//! file; see [`config`](super::config).

use crate::queue::QueueKey;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "ipc-dispatch")]
#[command(about = "Queue-backed worker pool for SysV message queues")]
#[command(version)]
#[command(after_help = "Queue keys are decimal or 0x-prefixed hexadecimal integers")]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVEL",
        global = true,
        value_parser = ["trace", "debug", "info", "warn", "error", "off"]
    )]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to log to the console)
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(
        short = 'o',
        long = "log-format",
        value_name = "FORMAT",
        global = true,
        value_parser = ["text", "ext", "json"]
    )]
    pub log_format: Option<String>,

    /// Force colored log output
    #[arg(short = 'g', long = "color", global = true, overrides_with = "no_color")]
    pub color: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true, overrides_with = "color")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a manager that receives tasks from the input queue
    Run(RunArgs),
    /// Send one message to an existing queue
    Send(SendArgs),
    /// Remove a queue
    Remove(RemoveArgs),
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    /// Manager name, also names the checkpoint directory
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Key of the queue to receive tasks from (created if absent)
    #[arg(short = 'i', long = "input-queue", value_name = "KEY")]
    pub input_queue: Option<QueueKey>,

    /// Key of an existing queue to forward tasks to
    #[arg(short = 'O', long = "output-queue", value_name = "KEY")]
    pub output_queue: Option<QueueKey>,

    /// Number of worker threads
    #[arg(short = 'w', long = "workers", value_name = "COUNT")]
    pub workers: Option<usize>,

    /// Maximum number of buffered tasks (default: unbounded)
    #[arg(short = 'b', long = "buffer-capacity", value_name = "COUNT")]
    pub buffer_capacity: Option<usize>,

    /// Directory under which the per-manager checkpoint directory is created
    #[arg(long = "checkpoint-root", value_name = "DIR")]
    pub checkpoint_root: Option<PathBuf>,

    /// Largest message payload accepted, in bytes
    #[arg(short = 'm', long = "max-message-size", value_name = "BYTES")]
    pub max_message_size: Option<usize>,
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct SendArgs {
    /// Key of the queue to send to (must exist)
    #[arg(short = 'q', long = "queue", value_name = "KEY")]
    pub queue: QueueKey,

    /// Message type, greater than 0
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value_t = 1)]
    pub message_type: i64,

    /// Message payload
    #[arg(value_name = "DATA")]
    pub data: String,
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct RemoveArgs {
    /// Key of the queue to remove
    #[arg(short = 'q', long = "queue", value_name = "KEY")]
    pub queue: QueueKey,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color choice made on the command line, if any
    pub fn color_override(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Log file to use; the magic values `none` and `-` mean the console
    pub fn resolved_log_file(&self) -> Option<PathBuf> {
        self.log_file
            .as_ref()
            .filter(|path| !is_console_log(path))
            .cloned()
    }

    pub fn run_args_mut(&mut self) -> Option<&mut RunArgs> {
        match &mut self.command {
            Command::Run(run) => Some(run),
            _ => None,
        }
    }
}

fn is_console_log(path: &std::path::Path) -> bool {
    let text = path.to_string_lossy();
    text.eq_ignore_ascii_case("none") || text == "-"
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config_file: None,
            log_level: None,
            log_file: None,
            log_format: None,
            color: false,
            no_color: false,
            command: Command::Run(RunArgs::default()),
        }
    }
}
