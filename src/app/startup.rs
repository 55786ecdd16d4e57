//! Application startup
//!
//! Parses the command line, merges the configuration file, starts logging
//! and dispatches the subcommand. Returns the process exit code.

use super::cli::{Args, Command, RemoveArgs, RunArgs, SendArgs};
use super::handler::ForwardingHandler;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{init_logging, LogFormat, LogLevel};
use crate::core::validation::ValidationError;
use crate::core::version;
use crate::manager::{Manager, ManagerConfig, ManagerError, ManagerResult};
use crate::queue::{MessageQueue, QueueError, QueueKey};
use clap::Parser;
use std::io::IsTerminal;
use std::str::FromStr;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Run the application from the process arguments
pub fn startup() -> i32 {
    let args = Args::parse();
    startup_with_args(args)
}

/// Run the application with already parsed arguments
pub fn startup_with_args(mut args: Args) -> i32 {
    let config_file = args.config_file.clone();
    if let Err(e) = Args::parse_config_file(&mut args, config_file.as_deref()) {
        // Logging is not configured yet
        eprintln!("Error: {}", e);
        return EXIT_FAILURE;
    }

    let settings = match LogSettings::from_args(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    if let Err(e) = init_logging(
        settings.level,
        settings.format,
        settings.file.as_deref(),
        settings.color,
    ) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return EXIT_FAILURE;
    }

    log::debug!("ipc-dispatch {}", version::banner());
    log::debug!("Final arguments: {:?}", args);

    let outcome = match args.command {
        Command::Run(run) => run_manager(run, &settings),
        Command::Send(send) => send_message(send),
        Command::Remove(remove) => remove_queue(remove),
    };

    match outcome {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            log_error_with_context(&e, "ipc-dispatch");
            EXIT_FAILURE
        }
    }
}

/// Logging options after merging command line and configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<std::path::PathBuf>,
    pub color: bool,
}

impl LogSettings {
    pub fn from_args(args: &Args) -> Result<Self, ValidationError> {
        let level = match args.log_level.as_deref() {
            Some(level) => LogLevel::from_str(level).map_err(|e| ValidationError::new(&e))?,
            None => LogLevel::default(),
        };
        let format = match args.log_format.as_deref() {
            Some(format) => LogFormat::from_str(format).map_err(|e| ValidationError::new(&e))?,
            None => LogFormat::default(),
        };
        let color = args
            .color_override()
            .unwrap_or_else(|| std::io::stderr().is_terminal());

        Ok(Self {
            level,
            format,
            file: args.resolved_log_file(),
            color,
        })
    }
}

/// Build the manager configuration for `run`
pub fn manager_config(run: RunArgs, logging: &LogSettings) -> ManagerConfig {
    let mut config = ManagerConfig::default()
        .with_log_level(logging.level)
        .with_log_format(logging.format)
        .with_color(logging.color);

    if let Some(name) = run.name {
        config.name = name;
    }
    config.input_queue = run.input_queue;
    config.output_queue = run.output_queue;
    if let Some(workers) = run.workers {
        config = config.with_workers(workers);
    }
    config.buffer_capacity = run.buffer_capacity;
    config.checkpoint_root = run.checkpoint_root;
    if let Some(size) = run.max_message_size {
        config = config.with_max_message_size(size);
    }
    config.log_path = logging.file.clone();

    config
}

fn run_manager(run: RunArgs, logging: &LogSettings) -> ManagerResult<()> {
    let config = manager_config(run, logging);
    let manager = Manager::new(config, ForwardingHandler::new())?;

    log::info!(
        "Manager '{}' running with {} worker(s) on {}{}",
        manager.name(),
        manager.num_workers(),
        manager.input_queue().key(),
        manager
            .output_queue()
            .map(|q| format!(", forwarding to {}", q.key()))
            .unwrap_or_default()
    );

    let stats = manager.run()?;
    log::info!("Processed {} task(s)", stats.completed());
    Ok(())
}

fn send_message(send: SendArgs) -> ManagerResult<()> {
    let queue = attach_existing(send.queue)?;
    queue.send(send.message_type, send.data.as_bytes())?;
    log::info!(
        "Sent {} byte(s) of type {} to {}",
        send.data.len(),
        send.message_type,
        send.queue
    );
    Ok(())
}

/// Attach to a queue another process created
fn attach_existing(key: QueueKey) -> ManagerResult<MessageQueue> {
    MessageQueue::open_output(key, MessageQueue::DEFAULT_MAX_MESSAGE_SIZE).map_err(|e| match e {
        QueueError::NotFound { key } => {
            ManagerError::configuration(format!("Cannot find queue {}", key))
        }
        other => other.into(),
    })
}

fn remove_queue(remove: RemoveArgs) -> ManagerResult<()> {
    let queue = attach_existing(remove.queue)?;
    let pending = queue.pending().unwrap_or(0);
    queue.remove()?;
    log::info!("Removed queue {} ({} pending message(s) discarded)", remove.queue, pending);
    Ok(())
}
