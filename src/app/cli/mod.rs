//! CLI module containing argument parsing and configuration file loading

pub mod args;
pub mod config;

pub use args::{Args, Command, RemoveArgs, RunArgs, SendArgs};
pub use config::default_config_path;

#[cfg(test)]
mod tests;
