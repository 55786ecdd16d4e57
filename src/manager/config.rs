//! Manager configuration bundle

use crate::core::logging::{LogFormat, LogLevel};
use crate::core::strings::kebab_slug;
use crate::manager::error::{ManagerError, ManagerResult};
use crate::queue::{MessageQueue, QueueKey};
use std::path::PathBuf;

/// Directory under the home directory that holds per-instance checkpoints
pub const APP_DIR: &str = ".ipc-dispatch";

/// Everything a [`Manager`](crate::manager::Manager) needs at construction
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    /// Instance name; also names the checkpoint directory
    pub name: String,
    /// Key of the queue tasks are received from (required)
    pub input_queue: Option<QueueKey>,
    /// Key of an existing queue handlers may send results to
    pub output_queue: Option<QueueKey>,
    pub num_workers: usize,
    pub log_level: LogLevel,
    /// Log file; `None` logs to the console
    pub log_path: Option<PathBuf>,
    pub log_format: LogFormat,
    pub color: bool,
    /// Parent of the per-instance checkpoint directory; defaults to `~/.ipc-dispatch/checkpoints`
    pub checkpoint_root: Option<PathBuf>,
    /// Bound on buffered tasks; `None` is unbounded
    pub buffer_capacity: Option<usize>,
    pub max_message_size: usize,
    /// Remove the input queue and stop on SIGINT/SIGTERM
    pub handle_signals: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            name: "manager".to_string(),
            input_queue: None,
            output_queue: None,
            num_workers: Self::DEFAULT_NUM_WORKERS,
            log_level: LogLevel::default(),
            log_path: None,
            log_format: LogFormat::default(),
            color: false,
            checkpoint_root: None,
            buffer_capacity: None,
            max_message_size: MessageQueue::DEFAULT_MAX_MESSAGE_SIZE,
            handle_signals: true,
        }
    }
}

impl ManagerConfig {
    pub const DEFAULT_NUM_WORKERS: usize = 4;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_input_queue(mut self, key: QueueKey) -> Self {
        self.input_queue = Some(key);
        self
    }

    pub fn with_output_queue(mut self, key: QueueKey) -> Self {
        self.output_queue = Some(key);
        self
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_checkpoint_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.checkpoint_root = Some(root.into());
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_signal_handling(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    /// `~/.ipc-dispatch/checkpoints`, if a home directory is known
    pub fn default_checkpoint_root() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(APP_DIR).join("checkpoints"))
    }

    /// `<checkpoint_root>/<name-lower-kebab>`
    pub fn checkpoint_dir(&self) -> ManagerResult<PathBuf> {
        let root = match &self.checkpoint_root {
            Some(root) => root.clone(),
            None => Self::default_checkpoint_root().ok_or_else(|| {
                ManagerError::configuration(
                    "Cannot determine the home directory for checkpoints; set a checkpoint root",
                )
            })?,
        };
        Ok(root.join(kebab_slug(&self.name)))
    }

    /// Check required settings, returning the input queue key
    pub fn validate(&self) -> ManagerResult<QueueKey> {
        if self.name.trim().is_empty() {
            return Err(ManagerError::configuration("Manager name must not be empty"));
        }
        if self.max_message_size == 0 {
            return Err(ManagerError::configuration(
                "Maximum message size must be greater than zero",
            ));
        }
        let limit = MessageQueue::system_max_message_size();
        if self.max_message_size > limit {
            return Err(ManagerError::configuration(format!(
                "Maximum message size {} exceeds the system limit of {} bytes",
                self.max_message_size, limit
            )));
        }
        self.input_queue
            .ok_or_else(|| ManagerError::configuration("ID for the input queue must be specified"))
    }
}
