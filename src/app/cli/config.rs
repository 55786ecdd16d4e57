//! TOML configuration file parsing and loading
//!
//! The configuration file supplies defaults for anything not given on the
//! command line. Keys use the long option names:
//!
//! ```toml
//! name = "Variant Calling"
//! input-queue = "0x4d2"      # or an integer
//! output-queue = 1235
//! workers = 8
//! buffer-capacity = 1000
//! checkpoint-root = "/var/lib/ipc-dispatch"
//! max-message-size = 8192
//! log-level = "debug"
//! log-file = "none"
//! log-format = "ext"
//! color = false
//! ```

use crate::core::validation::{validate_count, validate_positive, ValidationError};
use crate::queue::QueueKey;
use std::path::{Path, PathBuf};

use super::args::Args;

/// Default configuration file: `<config_dir>/ipc-dispatch/ipc-dispatch.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ipc-dispatch").join("ipc-dispatch.toml"))
}

impl Args {
    /// Load the configuration file into `args` and return the raw table
    ///
    /// A file named explicitly must exist; the default file is optional.
    /// Returns `Ok(None)` when there is no file to load.
    pub fn parse_config_file(
        args: &mut Self,
        config_file: Option<&Path>,
    ) -> Result<Option<toml::Table>, ValidationError> {
        let config_path = match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ValidationError::new(&format!(
                        "The specified configuration file does not exist: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(None),
            },
        };

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            ValidationError::new(&format!(
                "Error reading configuration file {}: {}",
                config_path.display(),
                e
            ))
        })?;
        let config = toml::from_str::<toml::Table>(&contents).map_err(|e| {
            ValidationError::new(&format!(
                "Error parsing configuration file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        Self::apply_toml_values(args, &config).map_err(|e| {
            ValidationError::new(&format!(
                "Error in configuration file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        log::debug!("Loaded configuration from {}", config_path.display());
        Ok(Some(config))
    }

    /// Fill every value not already set on the command line from `config`
    pub fn apply_toml_values(args: &mut Self, config: &toml::Table) -> Result<(), ValidationError> {
        if args.log_level.is_none() {
            args.log_level = string_value(config, "log-level")?;
        }
        if args.log_file.is_none() {
            args.log_file = string_value(config, "log-file")?.map(PathBuf::from);
        }
        if args.log_format.is_none() {
            args.log_format = string_value(config, "log-format")?;
        }
        if args.color_override().is_none() {
            match bool_value(config, "color")? {
                Some(true) => args.color = true,
                Some(false) => args.no_color = true,
                None => {}
            }
        }

        // The remaining keys only configure `run`
        let Some(run) = args.run_args_mut() else {
            return Ok(());
        };

        if run.name.is_none() {
            run.name = string_value(config, "name")?;
        }
        if run.input_queue.is_none() {
            run.input_queue = queue_key_value(config, "input-queue")?;
        }
        if run.output_queue.is_none() {
            run.output_queue = queue_key_value(config, "output-queue")?;
        }
        if run.workers.is_none() {
            run.workers = integer_value(config, "workers")?
                .map(|v| validate_count("workers", v))
                .transpose()?;
        }
        if run.buffer_capacity.is_none() {
            run.buffer_capacity = integer_value(config, "buffer-capacity")?
                .map(|v| validate_positive("buffer-capacity", v))
                .transpose()?;
        }
        if run.checkpoint_root.is_none() {
            run.checkpoint_root = string_value(config, "checkpoint-root")?.map(PathBuf::from);
        }
        if run.max_message_size.is_none() {
            run.max_message_size = integer_value(config, "max-message-size")?
                .map(|v| validate_positive("max-message-size", v))
                .transpose()?;
        }

        Ok(())
    }
}

fn type_error(key: &str, expected: &str, value: &toml::Value) -> ValidationError {
    ValidationError::new(&format!(
        "'{}' must be {}, got {}",
        key,
        expected,
        value.type_str()
    ))
}

fn string_value(config: &toml::Table, key: &str) -> Result<Option<String>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| type_error(key, "a string", value)),
    }
}

fn integer_value(config: &toml::Table, key: &str) -> Result<Option<i64>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .map(Some)
            .ok_or_else(|| type_error(key, "an integer", value)),
    }
}

fn bool_value(config: &toml::Table, key: &str) -> Result<Option<bool>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| type_error(key, "a boolean", value)),
    }
}

/// Queue keys may be written as integers or as strings (`"0x4d2"`)
fn queue_key_value(config: &toml::Table, key: &str) -> Result<Option<QueueKey>, ValidationError> {
    let parsed = match config.get(key) {
        None => return Ok(None),
        Some(toml::Value::Integer(raw)) => libc::key_t::try_from(*raw)
            .map_err(|_| ValidationError::new(&format!("'{}' is out of range: {}", key, raw)))
            .and_then(|raw| {
                QueueKey::new(raw).map_err(|e| ValidationError::new(&format!("'{}': {}", key, e)))
            })?,
        Some(toml::Value::String(text)) => text
            .parse::<QueueKey>()
            .map_err(|e| ValidationError::new(&format!("'{}': {}", key, e)))?,
        Some(other) => return Err(type_error(key, "an integer or a string", other)),
    };
    Ok(Some(parsed))
}
